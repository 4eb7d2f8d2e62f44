//! Cross-reference tables loaded once before indexing starts.
//!
//! Both tables are plain lookups; nothing mutates them after construction.

use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};
use fxhash::FxHashMap;
use tracing::{debug, info};

use clinidx_core::consts::PUBMED_PREFIX;
use clinidx_core::utils::{column, get_dynamic_reader, is_missing};

/// An Experimental Factor Ontology term a trait name maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EfoTerm {
    pub id: String,
    pub name: String,
    pub url: String,
}

///
/// Trait name to EFO term lookup, built from a tab-separated file with the
/// columns `trait name`, `url`, `id`, `name`.
///
#[derive(Debug, Clone, Default)]
pub struct EfoMap {
    terms: FxHashMap<String, EfoTerm>,
}

impl EfoMap {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Loading EFO terms from {:?}", path);
        let reader = get_dynamic_reader(path)?;
        let mut terms = FxHashMap::default();

        for line in reader.lines() {
            let line = line.with_context(|| format!("Failed reading EFO file {:?}", path))?;
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 4 || fields[0].is_empty() {
                debug!("Skipping malformed EFO line: {:?}", line);
                continue;
            }
            terms.insert(
                fields[0].to_string(),
                EfoTerm {
                    id: fields[2].to_string(),
                    name: fields[3].to_string(),
                    url: fields[1].to_string(),
                },
            );
        }

        info!("{} EFO terms loaded", terms.len());
        Ok(EfoMap { terms })
    }

    pub fn get(&self, trait_name: &str) -> Option<&EfoTerm> {
        self.terms.get(trait_name)
    }

    ///
    /// Ontology label for a trait, falling back to the raw trait name when the
    /// trait is not mapped.
    ///
    pub fn resolve_label(&self, trait_name: &str) -> String {
        match self.terms.get(trait_name) {
            Some(term) if !term.name.is_empty() => term.name.clone(),
            _ => trait_name.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

///
/// Reference id to `PMID:<id>` lookup, built from a companion references file.
/// The first line is a header. Column 0 holds the reference id.
///
#[derive(Debug, Clone, Default)]
pub struct ReferenceMap {
    references: FxHashMap<String, String>,
}

impl ReferenceMap {
    pub fn from_file(path: &Path, pubmed_column: usize) -> Result<Self> {
        info!("Loading references from {:?}", path);
        let reader = get_dynamic_reader(path)?;
        let mut references = FxHashMap::default();

        for line in reader.lines().skip(1) {
            let line =
                line.with_context(|| format!("Failed reading references file {:?}", path))?;
            let fields: Vec<&str> = line.split('\t').collect();
            let id = column(&fields, 0);
            let pubmed = column(&fields, pubmed_column);
            if id.is_empty() || is_missing(pubmed) {
                continue;
            }
            references.insert(id.to_string(), format!("{}{}", PUBMED_PREFIX, pubmed));
        }

        info!("{} references loaded", references.len());
        Ok(ReferenceMap { references })
    }

    pub fn get(&self, reference_id: &str) -> Option<&str> {
        self.references.get(reference_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}
