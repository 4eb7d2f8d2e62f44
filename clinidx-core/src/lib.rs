//! # clinidx-core
//!
//! Shared building blocks for the clinidx indexer:
//!
//! - the canonical variant models (`SequenceLocation`, `VariantKey`)
//! - the persisted trait-association records (`Germline`, `Somatic`, `VariantTraitAssociation`)
//! - gzip-aware readers and writers for the source files

pub mod consts;
pub mod errors;
pub mod models;
pub mod utils;

pub use errors::ClinidxError;
pub use models::{
    Germline, SequenceLocation, Somatic, Strand, VariantKey, VariantTraitAssociation,
};
