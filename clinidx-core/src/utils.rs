use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

use crate::consts::MISSING_VALUE_TOKENS;

fn is_gzipped(path: &Path) -> bool {
    path.extension() == Some(OsStr::new("gz"))
}

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let file: Box<dyn Read> = match is_gzipped(path) {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

///
/// Get a writer that gzip-compresses when the path ends in `.gz`.
///
/// # Arguments
///
/// - path: path to the file to create
///
pub fn get_dynamic_writer(path: &Path) -> Result<Box<dyn Write>> {
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
    let writer: Box<dyn Write> = match is_gzipped(path) {
        true => Box::new(GzEncoder::new(BufWriter::new(file), Compression::default())),
        false => Box::new(BufWriter::new(file)),
    };

    Ok(writer)
}

///
/// True when a source cell carries no information: it is blank or made up
/// solely of placeholder tokens such as `NA`, `NS`, `null` or `-`.
///
pub fn is_missing(value: &str) -> bool {
    let mut stripped = value.to_string();
    for token in MISSING_VALUE_TOKENS {
        stripped = stripped.replace(token, "");
    }
    stripped.chars().all(char::is_whitespace)
}

/// `Some(value)` unless the cell is missing.
pub fn non_missing(value: &str) -> Option<String> {
    if is_missing(value) {
        None
    } else {
        Some(value.to_string())
    }
}

/// Fetch a column from a split line, treating out-of-range indices as empty.
pub fn column<'a>(fields: &[&'a str], index: usize) -> &'a str {
    fields.get(index).copied().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::BufRead;

    #[rstest]
    #[case("", true)]
    #[case("  ", true)]
    #[case("NA", true)]
    #[case("NS", true)]
    #[case("null", true)]
    #[case("-", true)]
    #[case(".", true)]
    #[case("not specified", true)]
    #[case("skin", false)]
    #[case("PMID", false)]
    #[case("12345", false)]
    fn test_is_missing(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_missing(value), expected);
    }

    #[rstest]
    fn test_column_out_of_range() {
        let fields = vec!["a", "b"];
        assert_eq!(column(&fields, 1), "b");
        assert_eq!(column(&fields, 7), "");
    }

    #[rstest]
    fn test_gz_round_trip_through_dynamic_io() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("lines.txt.gz");
        {
            let mut writer = get_dynamic_writer(&path).unwrap();
            writeln!(writer, "first").unwrap();
            writeln!(writer, "second").unwrap();
            writer.flush().unwrap();
        }
        let reader = get_dynamic_reader(&path).unwrap();
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[rstest]
    fn test_missing_file_has_context() {
        let err = get_dynamic_reader(Path::new("does/not/exist.tsv")).err().unwrap();
        assert!(err.to_string().contains("Failed to open file"));
    }
}
