//! ClinVar release XML, optionally combined with `variant_summary.txt`
//! coordinates and an EFO trait mapping.

pub mod summary;
pub mod xml;

use std::collections::BTreeSet;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::Result;
use tracing::info;

use clinidx_core::consts::{CLINVAR_SOURCE, PUBMED_PREFIX};
use clinidx_core::{Germline, SequenceLocation, Somatic, VariantTraitAssociation};

use crate::config::Assembly;
use crate::driver::SourceIndexer;
use crate::mutation::Alleles;
use crate::position::GenomicPosition;
use crate::stats::{IndexingStats, SkipReason};
use crate::store::MergePolicy;
use crate::xref::EfoMap;

pub use summary::VariantSummary;
pub use xml::{ClinVarReader, ClinVarRecord, ClinVarTrait, XmlLocation};

fn xml_allele(value: &str) -> String {
    if value == "-" { String::new() } else { value.to_string() }
}

///
/// Convert an embedded `SequenceLocation`. Locations lacking any of the
/// coordinate or allele attributes cannot be keyed and yield `None`.
///
fn xml_location(location: &XmlLocation) -> Option<SequenceLocation> {
    let start = location.start.as_deref()?.trim().parse::<i64>().ok()?;
    let end = location.stop.as_deref()?.trim().parse::<i64>().ok()?;
    Some(SequenceLocation::new(
        location.chromosome.as_deref()?,
        start,
        end,
        xml_allele(location.reference.as_deref()?),
        xml_allele(location.alternate.as_deref()?),
    ))
}

pub struct ClinVarIndexer<R: BufRead> {
    reader: ClinVarReader<R>,
    assembly: Assembly,
    summary: VariantSummary,
    efo: EfoMap,
}

impl ClinVarIndexer<BufReader<Box<dyn Read>>> {
    pub fn from_path(
        path: &Path,
        assembly: Assembly,
        summary: VariantSummary,
        efo: EfoMap,
    ) -> Result<Self> {
        info!("Parsing ClinVar XML {:?}", path);
        Ok(ClinVarIndexer::new(ClinVarReader::from_path(path)?, assembly, summary, efo))
    }
}

impl<R: BufRead> ClinVarIndexer<R> {
    pub fn new(
        reader: ClinVarReader<R>,
        assembly: Assembly,
        summary: VariantSummary,
        efo: EfoMap,
    ) -> Self {
        ClinVarIndexer {
            reader,
            assembly,
            summary,
            efo,
        }
    }

    ///
    /// Locations of a record for the configured assembly. Summary coordinates
    /// win over the XML ones when the accession is listed there.
    ///
    fn locations(&self, record: &ClinVarRecord) -> Result<Vec<SequenceLocation>, SkipReason> {
        if let Some(summary) = record
            .accession
            .as_deref()
            .and_then(|acc| self.summary.get(acc))
            .filter(|locations| !locations.is_empty())
        {
            return Ok(summary.to_vec());
        }

        let candidates: Vec<&XmlLocation> = record
            .locations
            .iter()
            .filter(|l| l.assembly.as_deref().is_some_and(|a| self.assembly.matches(a)))
            .collect();
        if candidates.is_empty() {
            return Err(SkipReason::AssemblyMismatch);
        }
        let locations: Vec<SequenceLocation> =
            candidates.into_iter().filter_map(xml_location).collect();
        if locations.is_empty() {
            return Err(SkipReason::InvalidPosition);
        }
        Ok(locations)
    }

    fn first_location(&self, record: &ClinVarRecord) -> Result<SequenceLocation, SkipReason> {
        self.locations(record)?
            .into_iter()
            .next()
            .ok_or(SkipReason::InvalidPosition)
    }

    pub fn build_germline(&self, record: &ClinVarRecord, stats: &mut IndexingStats) -> Germline {
        let disease: BTreeSet<String> = record
            .traits
            .iter()
            .filter_map(ClinVarTrait::name)
            .map(|name| self.efo.resolve_label(name))
            .collect();
        if disease.is_empty() {
            stats.no_disease_trait += 1;
        }

        let inheritance_model: BTreeSet<String> = record
            .inheritance
            .iter()
            .chain(record.traits.iter().flat_map(|t| t.inheritance.iter()))
            .map(|m| m.trim().to_lowercase())
            .collect();
        if inheritance_model.len() > 1 {
            stats.multiple_inheritance_models += 1;
        }

        Germline {
            accession: record.accession.clone(),
            clinical_significance: record.clinical_significance.clone(),
            disease,
            review_status: record.review_status.clone(),
            source: Some(CLINVAR_SOURCE.to_string()),
            inheritance_model,
            gene_names: gene_names(record),
            bibliography: bibliography(record, false),
        }
    }

    pub fn build_somatic(&self, record: &ClinVarRecord) -> Option<Somatic> {
        if !record.observations.iter().any(|o| o.is_somatic()) {
            return None;
        }
        Some(Somatic {
            accession: record.accession.clone(),
            source: Some(CLINVAR_SOURCE.to_string()),
            review_status: record.review_status.clone(),
            gene_names: gene_names(record),
            bibliography: bibliography(record, true),
            ..Somatic::default()
        })
    }
}

fn gene_names(record: &ClinVarRecord) -> BTreeSet<String> {
    record.gene_symbols.iter().cloned().collect()
}

/// PubMed citations of the observations on one side of the somatic/germline split.
fn bibliography(record: &ClinVarRecord, somatic: bool) -> BTreeSet<String> {
    record
        .observations
        .iter()
        .filter(|o| o.is_somatic() == somatic)
        .flat_map(|o| o.pubmed_ids.iter())
        .map(|id| format!("{}{}", PUBMED_PREFIX, id))
        .collect()
}

impl<R: BufRead> SourceIndexer for ClinVarIndexer<R> {
    type Record = ClinVarRecord;

    fn name(&self) -> &'static str {
        "ClinVar"
    }

    fn merge_policy(&self) -> MergePolicy {
        MergePolicy::Append
    }

    fn next_record(&mut self) -> Result<Option<Self::Record>> {
        self.reader.next_record()
    }

    /// Position of the first location; `locate` is what the driver uses.
    fn parse_position(&self, record: &Self::Record) -> Result<GenomicPosition, SkipReason> {
        let first = self.first_location(record)?;
        Ok(GenomicPosition::new(first.chromosome, first.start, first.end))
    }

    fn parse_mutation(
        &mut self,
        record: &Self::Record,
        _position: &GenomicPosition,
    ) -> Result<Alleles, SkipReason> {
        let first = self.first_location(record)?;
        Ok(Alleles::new(first.reference, first.alternate))
    }

    fn build_records(
        &self,
        record: &Self::Record,
        stats: &mut IndexingStats,
    ) -> VariantTraitAssociation {
        let mut association = VariantTraitAssociation::new();
        association.germline.push(self.build_germline(record, stats));
        stats.germline_records += 1;
        if let Some(somatic) = self.build_somatic(record) {
            association.somatic.push(somatic);
            stats.somatic_records += 1;
        }
        association
    }

    /// One ClinVar record may map to several variants (compound records).
    fn locate(&mut self, record: &Self::Record) -> Result<Vec<SequenceLocation>, SkipReason> {
        self.locations(record)
    }
}
