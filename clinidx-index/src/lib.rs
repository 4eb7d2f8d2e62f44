//! # clinidx-index
//!
//! Builds a variant-keyed store of clinical trait associations from public
//! clinical variant resources: ClinVar, COSMIC, IARC TP53 and DoCM.
//!
//! Each source is parsed into normalized variants (chromosome, 1-based start,
//! reference and alternate allele on the positive strand) plus germline and
//! somatic trait records. All sources write into a single
//! [`AssociationStore`](store::AssociationStore); records for the same variant
//! are merged according to the source's [`MergePolicy`](store::MergePolicy).
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use clinidx_index::config::IndexerConfig;
//!
//! let config = IndexerConfig::try_from(Path::new("clinidx.toml")).unwrap();
//! let report = clinidx_index::pipeline::run(&config).unwrap();
//! println!("{} variants added", report.total.new_variants);
//! ```

pub mod config;
pub mod driver;
pub mod fasta;
pub mod mutation;
pub mod pipeline;
pub mod position;
pub mod sources;
pub mod stats;
pub mod store;
pub mod strand;
pub mod xref;

pub use driver::{SourceIndexer, index_source};
pub use stats::{IndexingStats, SkipReason};
pub use store::{AssociationStore, MergePolicy, UpsertOutcome};
