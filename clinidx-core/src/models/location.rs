use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::ClinidxError;

///
/// Strand a source record was reported on. Everything in the store is
/// positive-strand.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strand {
    #[default]
    Positive,
    Negative,
}

impl Strand {
    pub fn symbol(&self) -> &'static str {
        match self {
            Strand::Positive => "+",
            Strand::Negative => "-",
        }
    }
}

impl FromStr for Strand {
    type Err = ClinidxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+" | "1" => Ok(Strand::Positive),
            "-" | "-1" => Ok(Strand::Negative),
            other => Err(ClinidxError::InvalidStrand(other.to_string())),
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

///
/// A normalized genomic variant built from a single source record.
///
/// Coordinates are 1-based. Insertions carry an empty `reference`, deletions an
/// empty `alternate`.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceLocation {
    pub chromosome: String,
    pub start: i64,
    pub end: i64,
    pub reference: String,
    pub alternate: String,
    pub strand: Strand,
}

impl SequenceLocation {
    pub fn new(
        chromosome: impl Into<String>,
        start: i64,
        end: i64,
        reference: impl Into<String>,
        alternate: impl Into<String>,
    ) -> Self {
        SequenceLocation {
            chromosome: chromosome.into(),
            start,
            end,
            reference: reference.into(),
            alternate: alternate.into(),
            strand: Strand::Positive,
        }
    }

    ///
    /// Check that this location can be written to the store: a chromosome is
    /// present, the start is 1-based and both alleles only hold A, C, G or T.
    ///
    pub fn validate(&self) -> Result<(), ClinidxError> {
        if self.chromosome.trim().is_empty() {
            return Err(ClinidxError::InvalidLocation(format!(
                "empty chromosome in {}",
                self
            )));
        }
        if self.start < 1 {
            return Err(ClinidxError::InvalidLocation(format!(
                "start must be >= 1 in {}",
                self
            )));
        }
        if !is_nucleotide_string(&self.reference) || !is_nucleotide_string(&self.alternate) {
            return Err(ClinidxError::InvalidLocation(format!(
                "unresolved allele characters in {}",
                self
            )));
        }
        if self.reference.is_empty() && self.alternate.is_empty() {
            return Err(ClinidxError::InvalidLocation(format!(
                "both alleles are empty in {}",
                self
            )));
        }
        Ok(())
    }
}

impl Display for SequenceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{} {}>{} ({})",
            self.chromosome, self.start, self.end, self.reference, self.alternate, self.strand
        )
    }
}

/// True when every character is one of A, C, G, T. The empty string passes.
pub fn is_nucleotide_string(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T'))
}
