use std::fmt::{self, Display};
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unsupported genome assembly: {0}. Expected GRCh37 or GRCh38")]
    InvalidAssembly(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assembly {
    #[default]
    #[serde(rename = "GRCh37", alias = "grch37")]
    GRCh37,
    #[serde(rename = "GRCh38", alias = "grch38")]
    GRCh38,
}

impl Assembly {
    pub fn as_str(&self) -> &'static str {
        match self {
            Assembly::GRCh37 => "GRCh37",
            Assembly::GRCh38 => "GRCh38",
        }
    }

    /// Case-insensitive comparison against an assembly label found in a source file.
    pub fn matches(&self, label: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(label.trim())
    }
}

impl FromStr for Assembly {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grch37" => Ok(Assembly::GRCh37),
            "grch38" => Ok(Assembly::GRCh38),
            _ => Err(ConfigError::InvalidAssembly(s.to_string())),
        }
    }
}

impl Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ClinVarConfig {
    pub xml: PathBuf,
    pub summary: Option<PathBuf>,
    pub efo: Option<PathBuf>,
}

/// Column offsets of the assembly-dependent COSMIC fields (0-based).
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CosmicColumns {
    pub somatic_status: usize,
    pub pubmed: usize,
    pub sample_source: usize,
    pub tumour_origin: usize,
}

impl CosmicColumns {
    ///
    /// Default offsets per assembly.
    ///
    /// From release v78 the GRCh38 `CosmicMutantExport.tsv` header has a
    /// "Resistance Mutation" column at position 27 (1-based) that the GRCh37
    /// export lacks. Every field here sits after it, so each GRCh38 offset is
    /// one past its GRCh37 counterpart.
    ///
    pub fn for_assembly(assembly: Assembly) -> Self {
        match assembly {
            Assembly::GRCh37 => CosmicColumns {
                somatic_status: 29,
                pubmed: 30,
                sample_source: 32,
                tumour_origin: 33,
            },
            Assembly::GRCh38 => CosmicColumns {
                somatic_status: 30,
                pubmed: 31,
                sample_source: 33,
                tumour_origin: 34,
            },
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CosmicConfig {
    pub file: PathBuf,
    pub columns: Option<CosmicColumns>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct IarcConfig {
    pub germline: Option<PathBuf>,
    pub germline_references: Option<PathBuf>,
    pub somatic: Option<PathBuf>,
    pub somatic_references: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DocmConfig {
    pub file: PathBuf,
}

///
/// Description of one indexing run. Every source table is optional; a run
/// indexes whichever sources are configured.
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct IndexerConfig {
    #[serde(default)]
    pub assembly: Assembly,
    pub store: PathBuf,
    pub fasta: Option<PathBuf>,
    pub export: Option<PathBuf>,
    pub clinvar: Option<ClinVarConfig>,
    pub cosmic: Option<CosmicConfig>,
    pub iarc: Option<IarcConfig>,
    pub docm: Option<DocmConfig>,
}

fn rebase(base: &Path, path: &mut PathBuf) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}

fn rebase_opt(base: &Path, path: &mut Option<PathBuf>) {
    if let Some(p) = path.as_mut() {
        rebase(base, p);
    }
}

impl IndexerConfig {
    pub fn new(store: PathBuf, assembly: Assembly) -> Self {
        IndexerConfig {
            assembly,
            store,
            fasta: None,
            export: None,
            clinvar: None,
            cosmic: None,
            iarc: None,
            docm: None,
        }
    }

    ///
    /// Resolve every relative path in the config against `base`, normally
    /// the directory holding the config file.
    ///
    pub fn rebase_paths(&mut self, base: &Path) {
        rebase(base, &mut self.store);
        rebase_opt(base, &mut self.fasta);
        rebase_opt(base, &mut self.export);
        if let Some(clinvar) = self.clinvar.as_mut() {
            rebase(base, &mut clinvar.xml);
            rebase_opt(base, &mut clinvar.summary);
            rebase_opt(base, &mut clinvar.efo);
        }
        if let Some(cosmic) = self.cosmic.as_mut() {
            rebase(base, &mut cosmic.file);
        }
        if let Some(iarc) = self.iarc.as_mut() {
            rebase_opt(base, &mut iarc.germline);
            rebase_opt(base, &mut iarc.germline_references);
            rebase_opt(base, &mut iarc.somatic);
            rebase_opt(base, &mut iarc.somatic_references);
        }
        if let Some(docm) = self.docm.as_mut() {
            rebase(base, &mut docm.file);
        }
    }

    pub fn cosmic_columns(&self) -> CosmicColumns {
        self.cosmic
            .as_ref()
            .and_then(|c| c.columns)
            .unwrap_or_else(|| CosmicColumns::for_assembly(self.assembly))
    }
}

impl TryFrom<&Path> for IndexerConfig {
    type Error = ConfigError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let toml_str = read_to_string(path)?;
        let mut config: IndexerConfig = toml::from_str(&toml_str)?;
        if let Some(base) = path.parent() {
            config.rebase_paths(base);
        }
        Ok(config)
    }
}
