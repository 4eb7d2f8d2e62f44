//! Per-source record builders. Each submodule implements
//! [`SourceIndexer`](crate::driver::SourceIndexer) for one input format.

pub mod clinvar;
pub mod cosmic;
pub mod docm;
pub mod iarc;

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};

use clinidx_core::utils::get_dynamic_reader;

pub use clinvar::ClinVarIndexer;
pub use cosmic::CosmicIndexer;
pub use docm::DocmIndexer;
pub use iarc::{IarcLayout, IarcTp53Indexer};

/// Line reader for the tab-separated dumps. Blank lines are ignored.
pub struct TsvReader<R: BufRead> {
    reader: R,
    line: String,
    header_pending: bool,
}

impl TsvReader<BufReader<Box<dyn Read>>> {
    pub fn from_path(path: &Path, has_header: bool) -> Result<Self> {
        let reader = get_dynamic_reader(path)?;
        Ok(TsvReader::new(reader, has_header))
    }
}

impl<R: BufRead> TsvReader<R> {
    pub fn new(reader: R, has_header: bool) -> Self {
        TsvReader {
            reader,
            line: String::new(),
            header_pending: has_header,
        }
    }

    /// Next row split on tabs, keeping empty cells.
    pub fn next_row(&mut self) -> Result<Option<Vec<String>>> {
        loop {
            self.line.clear();
            let n = self
                .reader
                .read_line(&mut self.line)
                .context("Failed to read line")?;
            if n == 0 {
                return Ok(None);
            }
            if self.header_pending {
                self.header_pending = false;
                continue;
            }
            let trimmed = self.line.trim_end_matches(['\n', '\r']);
            if trimmed.is_empty() {
                continue;
            }
            return Ok(Some(trimmed.split('\t').map(str::to_string).collect()));
        }
    }
}

/// Cell `index` of a row, or `""` when the row is too short.
pub(crate) fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}
