pub mod association;
pub mod key;
pub mod location;

pub use association::{Germline, Somatic, VariantTraitAssociation};
pub use key::VariantKey;
pub use location::{SequenceLocation, Strand};
