//! ClinVar `variant_summary.txt`: normalized coordinates per RCV accession.
//!
//! When supplied, these locations take precedence over the ones embedded in
//! the XML release.

use std::io::BufRead;
use std::path::Path;

use anyhow::Result;
use fxhash::FxHashMap;
use tracing::{debug, info};

use clinidx_core::SequenceLocation;
use clinidx_core::consts::MISSING_VALUE_TOKENS;
use clinidx_core::utils::is_missing;

use crate::config::Assembly;
use crate::sources::{TsvReader, cell};

const ALLELE_ID_COLUMN: usize = 0;
const RCV_COLUMN: usize = 11;
const ASSEMBLY_COLUMN: usize = 16;
const CHROMOSOME_COLUMN: usize = 18;
const START_COLUMN: usize = 19;
const END_COLUMN: usize = 20;
const REFERENCE_COLUMN: usize = 21;
const ALTERNATE_COLUMN: usize = 22;

///
/// An allele may be `-` (insertions, deletions), but a blank cell or one made
/// of placeholder words marks it as unknown.
///
fn is_missing_allele(allele: &str) -> bool {
    let mut stripped = allele.to_string();
    for token in MISSING_VALUE_TOKENS.iter().filter(|t| **t != "-") {
        stripped = stripped.replace(token, "");
    }
    stripped.is_empty()
}

fn is_empty_allele(allele: &str) -> bool {
    allele.is_empty() || allele == "-"
}

fn allele(value: &str) -> String {
    if is_empty_allele(value) {
        String::new()
    } else {
        value.to_string()
    }
}

///
/// Location of one summary row, or `None` when the row is for another
/// assembly or lacks usable coordinates.
///
fn parse_location(row: &[String], assembly: Assembly) -> Option<SequenceLocation> {
    if !assembly.matches(cell(row, ASSEMBLY_COLUMN)) {
        return None;
    }
    let chromosome = cell(row, CHROMOSOME_COLUMN);
    let reference = cell(row, REFERENCE_COLUMN);
    let alternate = cell(row, ALTERNATE_COLUMN);
    if is_missing(chromosome)
        || is_missing_allele(reference)
        || is_missing_allele(alternate)
        || reference == alternate
    {
        return None;
    }
    let start = cell(row, START_COLUMN).trim().parse::<i64>().ok()?;
    let end = cell(row, END_COLUMN).trim().parse::<i64>().ok()?;

    // insertions reported without a reference allele start after the anchor base
    let (start, end) = if is_empty_allele(reference) && !is_empty_allele(alternate) && end == start + 1
    {
        (end, start)
    } else {
        (start, end)
    };

    Some(SequenceLocation::new(
        chromosome,
        start,
        end,
        allele(reference),
        allele(alternate),
    ))
}

#[derive(Debug, Clone, Default)]
pub struct VariantSummary {
    locations: FxHashMap<String, Vec<SequenceLocation>>,
}

impl VariantSummary {
    pub fn from_file(path: &Path, assembly: Assembly) -> Result<Self> {
        info!("Loading ClinVar variant summary from {:?}", path);
        VariantSummary::from_rows(TsvReader::from_path(path, true)?, assembly)
    }

    pub fn from_rows<R: BufRead>(mut rows: TsvReader<R>, assembly: Assembly) -> Result<Self> {
        let mut locations: FxHashMap<String, Vec<SequenceLocation>> = FxHashMap::default();
        let mut skipped = 0u64;

        while let Some(row) = rows.next_row()? {
            let Some(location) = parse_location(&row, assembly) else {
                skipped += 1;
                continue;
            };
            if is_missing(cell(&row, ALLELE_ID_COLUMN)) {
                debug!("Variant summary row without allele id: {:?}", row);
                skipped += 1;
                continue;
            }

            let mut rcvs: Vec<&str> = cell(&row, RCV_COLUMN)
                .split(';')
                .map(str::trim)
                .filter(|rcv| !rcv.is_empty())
                .collect();
            rcvs.sort_unstable();
            rcvs.dedup();
            for rcv in rcvs {
                locations
                    .entry(rcv.to_string())
                    .or_default()
                    .push(location.clone());
            }
        }

        info!(
            "{} RCV accessions loaded for {}, {} rows skipped",
            locations.len(),
            assembly,
            skipped
        );
        Ok(VariantSummary { locations })
    }

    pub fn get(&self, accession: &str) -> Option<&[SequenceLocation]> {
        self.locations.get(accession).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
