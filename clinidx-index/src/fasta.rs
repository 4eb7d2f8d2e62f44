//! Random access to reference bases through a samtools-style `.fai` index.
//!
//! When no `.fai` sits next to the FASTA, the index is computed by scanning
//! the file once. Gzip-compressed FASTA is not supported since it cannot be
//! seeked.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use fxhash::FxHashMap;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum FastaError {
    #[error("Gzip-compressed FASTA is not supported: {0:?}")]
    Compressed(PathBuf),
    #[error("Malformed FASTA index line: {0}")]
    MalformedIndex(String),
    #[error("Sequence not found in FASTA: {0}")]
    MissingSequence(String),
    #[error("Region {chromosome}:{start}-{end} is outside the sequence (length {length})")]
    OutOfRange {
        chromosome: String,
        start: i64,
        end: i64,
        length: u64,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type FastaResult<T> = std::result::Result<T, FastaError>;

///
/// Source of reference bases. Coordinates are 1-based and inclusive.
///
pub trait SequenceLookup {
    fn fetch(&mut self, chromosome: &str, start: i64, end: i64) -> FastaResult<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FaiEntry {
    length: u64,
    offset: u64,
    line_bases: u64,
    line_bytes: u64,
}

impl FaiEntry {
    fn byte_offset(&self, pos: u64) -> u64 {
        self.offset + (pos / self.line_bases) * self.line_bytes + pos % self.line_bases
    }
}

pub struct IndexedFasta {
    path: PathBuf,
    file: File,
    index: FxHashMap<String, FaiEntry>,
}

impl IndexedFasta {
    pub fn open(path: &Path) -> FastaResult<Self> {
        if path.extension() == Some(OsStr::new("gz")) {
            return Err(FastaError::Compressed(path.to_path_buf()));
        }

        let mut fai_path = path.as_os_str().to_owned();
        fai_path.push(".fai");
        let fai_path = PathBuf::from(fai_path);

        let index = if fai_path.exists() {
            info!("Using FASTA index {:?}", fai_path);
            load_fai(&fai_path)?
        } else {
            info!("No .fai found, indexing {:?}", path);
            build_index(path)?
        };

        Ok(IndexedFasta {
            path: path.to_path_buf(),
            file: File::open(path)?,
            index,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sequence_names(&self) -> impl Iterator<Item = &String> {
        self.index.keys()
    }

    fn entry(&self, chromosome: &str) -> Option<&FaiEntry> {
        self.index.get(chromosome).or_else(|| match chromosome.strip_prefix("chr") {
            Some(bare) => self.index.get(bare),
            None => self.index.get(&format!("chr{}", chromosome)),
        })
    }
}

impl SequenceLookup for IndexedFasta {
    fn fetch(&mut self, chromosome: &str, start: i64, end: i64) -> FastaResult<String> {
        let entry = self
            .entry(chromosome)
            .cloned()
            .ok_or_else(|| FastaError::MissingSequence(chromosome.to_string()))?;

        if start < 1 || end < start || end as u64 > entry.length {
            return Err(FastaError::OutOfRange {
                chromosome: chromosome.to_string(),
                start,
                end,
                length: entry.length,
            });
        }

        let first = entry.byte_offset(start as u64 - 1);
        let last = entry.byte_offset(end as u64 - 1);
        let mut buffer = vec![0u8; (last - first + 1) as usize];
        self.file.seek(SeekFrom::Start(first))?;
        self.file.read_exact(&mut buffer)?;

        Ok(buffer
            .into_iter()
            .filter(|b| !matches!(b, b'\n' | b'\r'))
            .map(|b| (b as char).to_ascii_uppercase())
            .collect())
    }
}

fn load_fai(path: &Path) -> FastaResult<FxHashMap<String, FaiEntry>> {
    let reader = BufReader::new(File::open(path)?);
    let mut index = FxHashMap::default();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 5 {
            return Err(FastaError::MalformedIndex(line));
        }
        let parse = |s: &str| {
            s.parse::<u64>()
                .map_err(|_| FastaError::MalformedIndex(line.clone()))
        };
        let entry = FaiEntry {
            length: parse(fields[1])?,
            offset: parse(fields[2])?,
            line_bases: parse(fields[3])?,
            line_bytes: parse(fields[4])?,
        };
        if entry.line_bases == 0 {
            return Err(FastaError::MalformedIndex(line));
        }
        index.insert(fields[0].to_string(), entry);
    }

    Ok(index)
}

fn build_index(path: &Path) -> FastaResult<FxHashMap<String, FaiEntry>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut index = FxHashMap::default();

    let mut current: Option<(String, FaiEntry)> = None;
    let mut position: u64 = 0;
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line)? as u64;
        if bytes_read == 0 {
            break;
        }
        position += bytes_read;

        if let Some(header) = line.strip_prefix('>') {
            if let Some((name, entry)) = current.take() {
                index.insert(name, entry);
            }
            let name = header.split_whitespace().next().unwrap_or("").to_string();
            current = Some((
                name,
                FaiEntry {
                    length: 0,
                    offset: position,
                    line_bases: 0,
                    line_bytes: 0,
                },
            ));
            continue;
        }

        if let Some((_, entry)) = current.as_mut() {
            let bases = line.trim_end_matches(['\n', '\r']).len() as u64;
            if entry.line_bases == 0 && bases > 0 {
                entry.line_bases = bases;
                entry.line_bytes = bytes_read;
            }
            entry.length += bases;
        }
    }

    if let Some((name, entry)) = current.take() {
        index.insert(name, entry);
    }
    index.retain(|_, entry| entry.line_bases > 0);

    Ok(index)
}
