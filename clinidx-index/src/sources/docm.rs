//! DoCM (Database of Curated Mutations) JSON-lines dump.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use clinidx_core::VariantTraitAssociation;
use clinidx_core::utils::get_dynamic_reader;

use crate::config::Assembly;
use crate::driver::SourceIndexer;
use crate::mutation::Alleles;
use crate::position::GenomicPosition;
use crate::stats::{IndexingStats, SkipReason};
use crate::store::MergePolicy;

/// Fields of one DoCM line used for indexing. Everything else is ignored.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DocmVariant {
    pub chromosome: String,
    pub start: i64,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub variant: String,
    pub reference_version: String,
}

fn allele(value: &str) -> &str {
    if value == "-" { "" } else { value }
}

pub struct DocmIndexer<R: BufRead> {
    reader: R,
    line: String,
    assembly: Assembly,
}

impl DocmIndexer<BufReader<Box<dyn Read>>> {
    pub fn from_path(path: &Path, assembly: Assembly) -> Result<Self> {
        info!("Parsing DOCM file {:?}", path);
        Ok(DocmIndexer::new(get_dynamic_reader(path)?, assembly))
    }
}

impl<R: BufRead> DocmIndexer<R> {
    pub fn new(reader: R, assembly: Assembly) -> Self {
        DocmIndexer {
            reader,
            line: String::new(),
            assembly,
        }
    }
}

impl<R: BufRead> SourceIndexer for DocmIndexer<R> {
    /// `None` marks a line that is not a valid DoCM object.
    type Record = Option<DocmVariant>;

    fn name(&self) -> &'static str {
        "DOCM"
    }

    fn merge_policy(&self) -> MergePolicy {
        MergePolicy::Append
    }

    fn next_record(&mut self) -> Result<Option<Self::Record>> {
        loop {
            self.line.clear();
            let n = self
                .reader
                .read_line(&mut self.line)
                .context("Failed to read DOCM line")?;
            if n == 0 {
                return Ok(None);
            }
            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }
            return Ok(Some(match serde_json::from_str::<DocmVariant>(line) {
                Ok(variant) => Some(variant),
                Err(e) => {
                    debug!("Unparseable DOCM line: {}", e);
                    None
                }
            }));
        }
    }

    fn parse_position(&self, record: &Self::Record) -> Result<GenomicPosition, SkipReason> {
        let variant = record.as_ref().ok_or(SkipReason::Malformed)?;
        if !variant.reference_version.eq_ignore_ascii_case(self.assembly.as_str()) {
            return Err(SkipReason::AssemblyMismatch);
        }
        let length = allele(&variant.reference).len().max(1) as i64;
        Ok(GenomicPosition::new(
            variant.chromosome.clone(),
            variant.start,
            variant.start + length - 1,
        ))
    }

    fn parse_mutation(
        &mut self,
        record: &Self::Record,
        _position: &GenomicPosition,
    ) -> Result<Alleles, SkipReason> {
        let variant = record.as_ref().ok_or(SkipReason::Malformed)?;
        Ok(Alleles::new(allele(&variant.reference), allele(&variant.variant)))
    }

    fn build_records(
        &self,
        _record: &Self::Record,
        _stats: &mut IndexingStats,
    ) -> VariantTraitAssociation {
        VariantTraitAssociation::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Cursor;

    const LINES: &str = r#"{"chromosome":"7","start":140453136,"reference":"A","variant":"T","reference_version":"GRCh37","hgvs":"ENST00000288602:c.1799T>A","diseases":[]}
{"chromosome":"7","start":140753336,"reference":"A","variant":"T","reference_version":"GRCh38"}

not json
{"chromosome":"17","start":7577548,"reference":"C","variant":"-","reference_version":"grch37"}
"#;

    fn docm() -> DocmIndexer<Cursor<&'static str>> {
        DocmIndexer::new(Cursor::new(LINES), Assembly::GRCh37)
    }

    #[rstest]
    fn test_records_and_skips() {
        let mut docm = docm();
        let mut results = vec![];
        while let Some(record) = docm.next_record().unwrap() {
            results.push(docm.locate(&record));
        }

        assert_eq!(results.len(), 4);
        let snv = &results[0].as_ref().unwrap()[0];
        assert_eq!(snv.chromosome, "7");
        assert_eq!(snv.start, 140453136);
        assert_eq!((snv.reference.as_str(), snv.alternate.as_str()), ("A", "T"));
        assert_eq!(results[1], Err(SkipReason::AssemblyMismatch));
        assert_eq!(results[2], Err(SkipReason::Malformed));
        let deletion = &results[3].as_ref().unwrap()[0];
        assert_eq!((deletion.reference.as_str(), deletion.alternate.as_str()), ("C", ""));
    }

    #[rstest]
    fn test_association_is_empty() {
        let mut docm = docm();
        let record = docm.next_record().unwrap().unwrap();
        let mut stats = IndexingStats::new();
        assert!(docm.build_records(&record, &mut stats).is_empty());
        assert_eq!(stats, IndexingStats::new());
    }
}
