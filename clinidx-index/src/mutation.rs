//! Parser for the mutation descriptions used by COSMIC (`c.` coordinates) and
//! IARC TP53 (`g.` coordinates).
//!
//! Descriptions are classified in a fixed priority order: substitution (`>`),
//! deletion (`del`), insertion (`ins`), duplication (`dup`). Anything else is an
//! unrecognized grammar. Each failure maps to exactly one [`MutationError`] so
//! callers can count data loss per grammar class.

use regex::Regex;
use thiserror::Error;

use clinidx_core::Strand;

use crate::strand::normalize_strand;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationError {
    #[error("invalid substitution")]
    InvalidSubstitution,
    #[error("invalid deletion")]
    InvalidDeletion,
    #[error("invalid insertion")]
    InvalidInsertion,
    #[error("duplications are not supported")]
    UnsupportedDuplication,
    #[error("unrecognized mutation grammar")]
    UnrecognizedGrammar,
}

pub type MutationResult<T> = std::result::Result<T, MutationError>;

/// Coordinate system prefix of the description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// Coding DNA, e.g. `c.1799T>A`.
    Coding,
    /// Genomic DNA, e.g. `g.7577120C>T`.
    Genomic,
}

impl Grammar {
    fn prefix(&self) -> &'static str {
        match self {
            Grammar::Coding => "c",
            Grammar::Genomic => "g",
        }
    }
}

/// Class of a description, decided by the first matching marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Substitution,
    Deletion,
    Insertion,
    Duplication,
    Other,
}

impl MutationKind {
    pub fn classify(description: &str) -> Self {
        if description.contains('>') {
            MutationKind::Substitution
        } else if description.contains("del") {
            MutationKind::Deletion
        } else if description.contains("ins") {
            MutationKind::Insertion
        } else if description.contains("dup") {
            MutationKind::Duplication
        } else {
            MutationKind::Other
        }
    }
}

/// Positive-strand alleles of a parsed description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alleles {
    pub reference: String,
    pub alternate: String,
}

impl Alleles {
    pub fn new(reference: impl Into<String>, alternate: impl Into<String>) -> Self {
        Alleles {
            reference: reference.into(),
            alternate: alternate.into(),
        }
    }
}

/// What follows `del` in a deletion description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionTail {
    /// Literal deleted bases, as written in the source (not strand-normalized).
    Sequence(String),
    /// Number of deleted bases; the sequence itself is not given.
    Length(u64),
}

pub(crate) fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_nucleotides(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T'))
}

///
/// Split a deletion description and classify what follows `del`.
///
pub fn deletion_tail(description: &str) -> MutationResult<DeletionTail> {
    let parts: Vec<&str> = description.split("del").collect();
    if parts.len() != 2 || parts[1].is_empty() {
        return Err(MutationError::InvalidDeletion);
    }
    let tail = parts[1];
    if is_numeric(tail) {
        let length = tail
            .parse::<u64>()
            .map_err(|_| MutationError::InvalidDeletion)?;
        return Ok(DeletionTail::Length(length));
    }
    if is_nucleotides(tail) {
        Ok(DeletionTail::Sequence(tail.to_string()))
    } else {
        Err(MutationError::InvalidDeletion)
    }
}

///
/// Grammar-aware mutation parser. Holds the compiled substitution pattern so
/// it can be reused across every row of a file.
///
#[derive(Debug, Clone)]
pub struct MutationParser {
    grammar: Grammar,
    substitution: Regex,
}

impl MutationParser {
    pub fn new(grammar: Grammar) -> Self {
        let pattern = format!(
            r"^{}\.\d+(_\d+)?(?P<ref>[ACGT]+)>(?P<alt>[ACGT]+)$",
            grammar.prefix()
        );
        // pattern is built from a fixed template
        let substitution = Regex::new(&pattern).expect("valid substitution pattern");
        MutationParser {
            grammar,
            substitution,
        }
    }

    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    ///
    /// Parse a description into positive-strand alleles.
    ///
    /// # Arguments
    ///
    /// - description: source mutation string, e.g. `c.35G>A` or `c.5_6insTT`
    /// - strand: strand the description was reported on
    ///
    pub fn parse(&self, description: &str, strand: Strand) -> MutationResult<Alleles> {
        match MutationKind::classify(description) {
            MutationKind::Substitution => self.parse_substitution(description, strand),
            MutationKind::Deletion => match deletion_tail(description)? {
                DeletionTail::Sequence(seq) => Ok(Alleles::new(normalize_strand(&seq, strand), "")),
                // the deleted bases are unknown without a reference lookup
                DeletionTail::Length(_) => Err(MutationError::InvalidDeletion),
            },
            MutationKind::Insertion => parse_insertion(description, strand),
            MutationKind::Duplication => Err(MutationError::UnsupportedDuplication),
            MutationKind::Other => Err(MutationError::UnrecognizedGrammar),
        }
    }

    pub fn parse_substitution(&self, description: &str, strand: Strand) -> MutationResult<Alleles> {
        let captures = self
            .substitution
            .captures(description)
            .ok_or(MutationError::InvalidSubstitution)?;
        let reference = &captures["ref"];
        let alternate = &captures["alt"];
        if reference.eq_ignore_ascii_case("N") || alternate.eq_ignore_ascii_case("N") {
            return Err(MutationError::InvalidSubstitution);
        }

        Ok(Alleles::new(
            normalize_strand(reference, strand),
            normalize_strand(alternate, strand),
        ))
    }
}

fn parse_insertion(description: &str, strand: Strand) -> MutationResult<Alleles> {
    let parts: Vec<&str> = description.split("ins").collect();
    if parts.len() != 2 {
        return Err(MutationError::InvalidInsertion);
    }
    let tail = parts[1];
    // e.g. c.503_508ins30: the inserted sequence is not given
    if tail.is_empty() || is_numeric(tail) || !is_nucleotides(tail) {
        return Err(MutationError::InvalidInsertion);
    }

    Ok(Alleles::new("", normalize_strand(tail, strand)))
}
