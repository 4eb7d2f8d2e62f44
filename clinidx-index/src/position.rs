//! Resolution of free-text genomic positions such as `7:140453136-140453136`.

use regex::Regex;
use thiserror::Error;

use clinidx_core::Strand;

use crate::mutation::MutationKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("unrecognized position format: {0:?}")]
    Malformed(String),
    #[error("position out of range: {0:?}")]
    OutOfRange(String),
}

pub type PositionResult<T> = std::result::Result<T, PositionError>;

/// Chromosome, start and end resolved from a position field. Coordinates are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomicPosition {
    pub chromosome: String,
    pub start: i64,
    pub end: i64,
    /// Strand the record was reported on; positive unless the source says otherwise.
    pub strand: Strand,
}

impl GenomicPosition {
    pub fn new(chromosome: impl Into<String>, start: i64, end: i64) -> Self {
        GenomicPosition {
            chromosome: chromosome.into(),
            start,
            end,
            strand: Strand::Positive,
        }
    }
}

///
/// Map numeric sex and mitochondrial chromosome codes to their names:
/// `23` to `X`, `24` to `Y`, `25` to `MT`. Any other value is returned as is.
///
pub fn remap_chromosome(chromosome: &str) -> String {
    match chromosome {
        "23" => "X".to_string(),
        "24" => "Y".to_string(),
        "25" => "MT".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct PositionResolver {
    pattern: Regex,
}

impl Default for PositionResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionResolver {
    pub fn new() -> Self {
        // fixed pattern
        let pattern = Regex::new(r"^(?P<chr>\S+):(?P<start>\d+)-(?P<end>\d+)$")
            .expect("valid position pattern");
        PositionResolver { pattern }
    }

    ///
    /// Resolve a position field.
    ///
    /// # Arguments
    ///
    /// - position: the raw `chr:start-end` text
    /// - description: mutation description of the same record; insertions are
    ///   shifted one base right so the start is the first base after the
    ///   insertion point
    ///
    pub fn resolve(&self, position: &str, description: &str) -> PositionResult<GenomicPosition> {
        let captures = self
            .pattern
            .captures(position.trim())
            .ok_or_else(|| PositionError::Malformed(position.to_string()))?;

        let raw_start = captures["start"]
            .parse::<i64>()
            .map_err(|_| PositionError::OutOfRange(position.to_string()))?;
        let end = captures["end"]
            .parse::<i64>()
            .map_err(|_| PositionError::OutOfRange(position.to_string()))?;

        let start = match MutationKind::classify(description) {
            MutationKind::Insertion => raw_start + 1,
            _ => raw_start,
        };

        Ok(GenomicPosition::new(
            remap_chromosome(&captures["chr"]),
            start,
            end,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("23", "X")]
    #[case("24", "Y")]
    #[case("25", "MT")]
    #[case("7", "7")]
    #[case("X", "X")]
    #[case("MT", "MT")]
    fn test_remap_chromosome(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(remap_chromosome(input), expected);
        assert_eq!(remap_chromosome(&remap_chromosome(input)), expected);
    }

    #[rstest]
    fn test_resolve_snv() {
        let resolver = PositionResolver::new();
        let pos = resolver.resolve("7:140453136-140453136", "c.1799T>A").unwrap();
        assert_eq!(pos, GenomicPosition::new("7", 140453136, 140453136));
    }

    #[rstest]
    fn test_resolve_insertion_shifts_start() {
        let resolver = PositionResolver::new();
        let pos = resolver.resolve("12:100-101", "c.5_6insTT").unwrap();
        assert_eq!(pos.start, 101);
        assert_eq!(pos.end, 101);
    }

    #[rstest]
    fn test_resolve_remaps_mitochondrial_code() {
        let resolver = PositionResolver::new();
        let pos = resolver.resolve("25:73-73", "c.73A>G").unwrap();
        assert_eq!(pos.chromosome, "MT");
    }

    #[rstest]
    #[case("")]
    #[case("7:abc-10")]
    #[case("7:10")]
    #[case("7 10-11")]
    fn test_resolve_malformed(#[case] position: &str) {
        let resolver = PositionResolver::new();
        assert!(matches!(
            resolver.resolve(position, "c.1A>T"),
            Err(PositionError::Malformed(_))
        ));
    }
}
