//! Per-run counters and the summary logged at the end of each source.

use std::ops::AddAssign;

use tracing::info;

use crate::mutation::MutationError;
use crate::store::UpsertOutcome;

/// Why a record was left out of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InvalidPosition,
    Mutation(MutationError),
    /// Reference bases for a length-only deletion could not be fetched.
    SequenceLookup,
    /// The record belongs to another genome assembly.
    AssemblyMismatch,
    /// Resolved coordinates or alleles failed validation.
    InvalidLocation,
    /// The record could not be read at all (bad JSON, too few columns, ...).
    Malformed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexingStats {
    pub total_records: u64,
    pub indexed_records: u64,
    pub new_variants: u64,
    pub updated_variants: u64,

    pub invalid_position: u64,
    pub invalid_substitution: u64,
    pub invalid_deletion: u64,
    pub invalid_insertion: u64,
    pub unsupported_duplication: u64,
    pub unrecognized_grammar: u64,
    pub sequence_lookup_failures: u64,
    pub assembly_mismatch: u64,
    pub invalid_location: u64,
    pub malformed_records: u64,

    /// Locations dropped from records that still had at least one valid location.
    pub dropped_locations: u64,

    pub germline_records: u64,
    pub somatic_records: u64,
    pub no_disease_trait: u64,
    pub multiple_inheritance_models: u64,
    pub missing_references: u64,
}

impl IndexingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::InvalidPosition => self.invalid_position += 1,
            SkipReason::Mutation(MutationError::InvalidSubstitution) => {
                self.invalid_substitution += 1
            }
            SkipReason::Mutation(MutationError::InvalidDeletion) => self.invalid_deletion += 1,
            SkipReason::Mutation(MutationError::InvalidInsertion) => self.invalid_insertion += 1,
            SkipReason::Mutation(MutationError::UnsupportedDuplication) => {
                self.unsupported_duplication += 1
            }
            SkipReason::Mutation(MutationError::UnrecognizedGrammar) => {
                self.unrecognized_grammar += 1
            }
            SkipReason::SequenceLookup => self.sequence_lookup_failures += 1,
            SkipReason::AssemblyMismatch => self.assembly_mismatch += 1,
            SkipReason::InvalidLocation => self.invalid_location += 1,
            SkipReason::Malformed => self.malformed_records += 1,
        }
    }

    pub fn record_upsert(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::New => self.new_variants += 1,
            UpsertOutcome::Updated => self.updated_variants += 1,
        }
    }

    /// Records left out of the store, over all reasons.
    pub fn skipped(&self) -> u64 {
        self.invalid_position
            + self.invalid_substitution
            + self.invalid_deletion
            + self.invalid_insertion
            + self.unsupported_duplication
            + self.unrecognized_grammar
            + self.sequence_lookup_failures
            + self.assembly_mismatch
            + self.invalid_location
            + self.malformed_records
    }

    ///
    /// Log the end-of-run summary for one source. Only non-zero skip reasons
    /// are listed.
    ///
    pub fn log_summary(&self, source: &str) {
        info!("Total number of parsed {} records: {}", source, self.total_records);
        info!("Number of indexed {} records: {}", source, self.indexed_records);
        info!("Number of new variants in {}: {}", source, self.new_variants);
        info!("Number of updated variants during {} indexing: {}", source, self.updated_variants);

        if self.germline_records > 0 || self.somatic_records > 0 {
            info!(
                "{} germline and {} somatic {} records built",
                self.germline_records, self.somatic_records, source
            );
        }
        if self.no_disease_trait > 0 {
            info!("{} records without a disease trait name", self.no_disease_trait);
        }
        if self.multiple_inheritance_models > 0 {
            info!(
                "{} records with more than one inheritance model",
                self.multiple_inheritance_models
            );
        }
        if self.missing_references > 0 {
            info!("{} bibliography references could not be resolved", self.missing_references);
        }

        if self.dropped_locations > 0 {
            info!(
                "{} invalid locations dropped from indexed {} records",
                self.dropped_locations, source
            );
        }

        info!("{} {} records ignored", self.skipped(), source);
        let reasons = [
            (self.invalid_position, "invalid position"),
            (self.invalid_substitution, "invalid substitution"),
            (self.invalid_deletion, "invalid deletion"),
            (self.invalid_insertion, "invalid insertion"),
            (self.unsupported_duplication, "duplication"),
            (self.unrecognized_grammar, "unrecognized mutation description"),
            (self.sequence_lookup_failures, "failed reference sequence lookup"),
            (self.assembly_mismatch, "other genome assembly"),
            (self.invalid_location, "invalid alleles or coordinates"),
            (self.malformed_records, "malformed record"),
        ];
        for (count, reason) in reasons {
            if count > 0 {
                info!("\t- {} by {}", count, reason);
            }
        }
    }
}

impl AddAssign<&IndexingStats> for IndexingStats {
    fn add_assign(&mut self, other: &IndexingStats) {
        self.total_records += other.total_records;
        self.indexed_records += other.indexed_records;
        self.new_variants += other.new_variants;
        self.updated_variants += other.updated_variants;
        self.invalid_position += other.invalid_position;
        self.invalid_substitution += other.invalid_substitution;
        self.invalid_deletion += other.invalid_deletion;
        self.invalid_insertion += other.invalid_insertion;
        self.unsupported_duplication += other.unsupported_duplication;
        self.unrecognized_grammar += other.unrecognized_grammar;
        self.sequence_lookup_failures += other.sequence_lookup_failures;
        self.assembly_mismatch += other.assembly_mismatch;
        self.invalid_location += other.invalid_location;
        self.malformed_records += other.malformed_records;
        self.dropped_locations += other.dropped_locations;
        self.germline_records += other.germline_records;
        self.somatic_records += other.somatic_records;
        self.no_disease_trait += other.no_disease_trait;
        self.multiple_inheritance_models += other.multiple_inheritance_models;
        self.missing_references += other.missing_references;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_each_grammar_failure_has_its_own_counter() {
        let mut stats = IndexingStats::new();
        stats.record_skip(SkipReason::Mutation(MutationError::InvalidSubstitution));
        stats.record_skip(SkipReason::Mutation(MutationError::InvalidDeletion));
        stats.record_skip(SkipReason::Mutation(MutationError::InvalidDeletion));
        stats.record_skip(SkipReason::Mutation(MutationError::InvalidInsertion));
        stats.record_skip(SkipReason::Mutation(MutationError::UnsupportedDuplication));
        stats.record_skip(SkipReason::Mutation(MutationError::UnrecognizedGrammar));
        stats.record_skip(SkipReason::InvalidPosition);

        assert_eq!(stats.invalid_substitution, 1);
        assert_eq!(stats.invalid_deletion, 2);
        assert_eq!(stats.invalid_insertion, 1);
        assert_eq!(stats.unsupported_duplication, 1);
        assert_eq!(stats.unrecognized_grammar, 1);
        assert_eq!(stats.invalid_position, 1);
        assert_eq!(stats.skipped(), 7);
    }

    #[rstest]
    fn test_add_assign_folds_counters() {
        let mut total = IndexingStats::new();
        let mut cosmic = IndexingStats::new();
        cosmic.total_records = 3;
        cosmic.record_upsert(UpsertOutcome::New);
        cosmic.record_upsert(UpsertOutcome::Updated);
        let mut clinvar = IndexingStats::new();
        clinvar.total_records = 2;
        clinvar.record_upsert(UpsertOutcome::New);

        total += &cosmic;
        total += &clinvar;
        assert_eq!(total.total_records, 5);
        assert_eq!(total.new_variants, 2);
        assert_eq!(total.updated_variants, 1);
    }
}
