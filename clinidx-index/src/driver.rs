//! Shared indexing loop.
//!
//! Every source implements [`SourceIndexer`]; [`index_source`] streams its
//! records, turns each one into locations plus trait records, and folds them
//! into the store under the source's merge policy.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use clinidx_core::{SequenceLocation, VariantKey, VariantTraitAssociation};

use crate::mutation::Alleles;
use crate::position::GenomicPosition;
use crate::stats::{IndexingStats, SkipReason};
use crate::store::{AssociationStore, MergePolicy};

const PROGRESS_REFRESH: u64 = 10_000;

pub trait SourceIndexer {
    type Record;

    /// Source name used in logs and summaries.
    fn name(&self) -> &'static str;

    fn merge_policy(&self) -> MergePolicy;

    /// Next input record, or `None` at end of input. Errors are fatal.
    fn next_record(&mut self) -> Result<Option<Self::Record>>;

    fn parse_position(&self, record: &Self::Record) -> Result<GenomicPosition, SkipReason>;

    fn parse_mutation(
        &mut self,
        record: &Self::Record,
        position: &GenomicPosition,
    ) -> Result<Alleles, SkipReason>;

    /// Trait records to attach to every location of `record`.
    fn build_records(
        &self,
        record: &Self::Record,
        stats: &mut IndexingStats,
    ) -> VariantTraitAssociation;

    ///
    /// All normalized locations a record describes. Most sources describe a
    /// single variant; the default combines `parse_position` and
    /// `parse_mutation`.
    ///
    fn locate(&mut self, record: &Self::Record) -> Result<Vec<SequenceLocation>, SkipReason> {
        let position = self.parse_position(record)?;
        let alleles = self.parse_mutation(record, &position)?;
        Ok(vec![SequenceLocation {
            chromosome: position.chromosome,
            start: position.start,
            end: position.end,
            reference: alleles.reference,
            alternate: alleles.alternate,
            strand: position.strand,
        }])
    }
}

fn progress_bar(name: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg} ({pos} records, {per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("Indexing {}", name));
    pb
}

///
/// Run one source to completion against `store`.
///
/// Per-record problems are counted and skipped. Store failures abort the run
/// and are returned to the caller.
///
pub fn index_source<S: SourceIndexer>(
    source: &mut S,
    store: &mut AssociationStore,
) -> Result<IndexingStats> {
    let mut stats = IndexingStats::new();
    let policy = source.merge_policy();
    let pb = progress_bar(source.name());

    while let Some(record) = source.next_record()? {
        stats.total_records += 1;
        if stats.total_records % PROGRESS_REFRESH == 0 {
            pb.set_position(stats.total_records);
        }

        let locations = match source.locate(&record) {
            Ok(locations) => locations,
            Err(reason) => {
                debug!("Skipping {} record #{}: {:?}", source.name(), stats.total_records, reason);
                stats.record_skip(reason);
                continue;
            }
        };

        let mut valid = Vec::with_capacity(locations.len());
        let mut dropped = 0;
        for location in locations {
            match location.validate() {
                Ok(()) => valid.push(location),
                Err(e) => {
                    debug!("Dropping location: {}", e);
                    dropped += 1;
                }
            }
        }
        if valid.is_empty() {
            stats.record_skip(SkipReason::InvalidLocation);
            continue;
        }
        stats.dropped_locations += dropped;

        let association = source.build_records(&record, &mut stats);
        for location in &valid {
            let key = VariantKey::from(location);
            let outcome = store
                .upsert(&key, &association, policy)
                .with_context(|| format!("Failed to update {} while indexing {}", key, source.name()))?;
            stats.record_upsert(outcome);
        }
        stats.indexed_records += 1;
    }

    pb.set_position(stats.total_records);
    pb.finish_and_clear();
    stats.log_summary(source.name());

    Ok(stats)
}
