//! Constants shared across the clinidx crates.

/// Source tag stored on ClinVar records.
pub const CLINVAR_SOURCE: &str = "clinvar";

/// Source tag stored on COSMIC records.
pub const COSMIC_SOURCE: &str = "cosmic";

/// Source tag stored on IARC TP53 records.
pub const IARC_TP53_SOURCE: &str = "iarctp53";

/// Prefix for PubMed bibliography entries, e.g. `PMID:12345`.
pub const PUBMED_PREFIX: &str = "PMID:";

/// Separator between the fields of an encoded variant key.
pub const VARIANT_KEY_SEPARATOR: char = ':';

/// Tokens that mark an empty cell in the source dumps. A field made up only of
/// these tokens (and whitespace) is treated as missing.
pub const MISSING_VALUE_TOKENS: &[&str] = &[
    "not specified",
    "NS",
    "NA",
    "na",
    "NULL",
    "null",
    ".",
    "-",
];
