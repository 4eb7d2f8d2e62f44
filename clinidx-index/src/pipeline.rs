//! Full indexing run: every configured source, in a fixed order, into one store.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::{Assembly, ClinVarConfig, IarcConfig, IndexerConfig};
use crate::driver::index_source;
use crate::fasta::{IndexedFasta, SequenceLookup};
use crate::sources::clinvar::VariantSummary;
use crate::sources::{ClinVarIndexer, CosmicIndexer, DocmIndexer, IarcLayout, IarcTp53Indexer};
use crate::stats::IndexingStats;
use crate::store::AssociationStore;
use crate::xref::EfoMap;

/// Per-source statistics of one run plus their sum.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub sources: Vec<(&'static str, IndexingStats)>,
    pub total: IndexingStats,
    /// Number of associations written by the export step, when one was configured.
    pub exported: Option<u64>,
}

impl PipelineReport {
    fn add(&mut self, source: &'static str, stats: IndexingStats) {
        self.total += &stats;
        self.sources.push((source, stats));
    }

    pub fn stats(&self, source: &str) -> Option<&IndexingStats> {
        self.sources
            .iter()
            .find(|(name, _)| *name == source)
            .map(|(_, stats)| stats)
    }
}

fn input_exists(path: &Path, what: &str) -> bool {
    if path.exists() {
        true
    } else {
        warn!("{} file {:?} not found, skipping", what, path);
        false
    }
}

fn run_clinvar(
    config: &ClinVarConfig,
    assembly: Assembly,
    store: &mut AssociationStore,
    report: &mut PipelineReport,
) -> Result<()> {
    if !input_exists(&config.xml, "ClinVar XML") {
        return Ok(());
    }

    let efo = match config.efo.as_deref() {
        Some(path) if input_exists(path, "EFO") => EfoMap::from_file(path)?,
        _ => {
            warn!("No EFO terms loaded: raw ClinVar trait names will be stored");
            EfoMap::empty()
        }
    };
    let summary = match config.summary.as_deref() {
        Some(path) if input_exists(path, "ClinVar variant summary") => {
            VariantSummary::from_file(path, assembly)?
        }
        _ => VariantSummary::default(),
    };

    let mut clinvar = ClinVarIndexer::from_path(&config.xml, assembly, summary, efo)?;
    let stats = index_source(&mut clinvar, store).context("ClinVar indexing failed")?;
    report.add("ClinVar", stats);
    Ok(())
}

fn run_iarc(
    config: &IarcConfig,
    assembly: Assembly,
    fasta: Option<&Path>,
    store: &mut AssociationStore,
    report: &mut PipelineReport,
) -> Result<()> {
    let mut sequence: Option<Box<dyn SequenceLookup>> = match fasta {
        Some(path) if input_exists(path, "Reference FASTA") => {
            let fasta = IndexedFasta::open(path)
                .with_context(|| format!("Failed to open reference FASTA {:?}", path))?;
            Some(Box::new(fasta) as Box<dyn SequenceLookup>)
        }
        _ => None,
    };

    let tables = [
        (IarcLayout::germline(), &config.germline, &config.germline_references),
        (IarcLayout::somatic(), &config.somatic, &config.somatic_references),
    ];
    for (layout, data, references) in tables {
        let (Some(data), Some(references)) = (data.as_deref(), references.as_deref()) else {
            warn!("IARC TP53 {} table or its references not configured, skipping", layout.kind());
            continue;
        };
        if !input_exists(data, "IARC TP53") || !input_exists(references, "IARC TP53 references") {
            continue;
        }

        let mut iarc = IarcTp53Indexer::from_paths(data, references, layout, assembly, sequence.take())?;
        let stats = index_source(&mut iarc, store)
            .with_context(|| format!("IARC TP53 {} indexing failed", layout.kind()))?;
        sequence = iarc.into_sequence();
        report.add(
            if layout.germline { "IARC TP53 germline" } else { "IARC TP53 somatic" },
            stats,
        );
    }
    Ok(())
}

///
/// Index every configured source into the store at `config.store`, then
/// export the store when an export path is set.
///
/// Sources run in a fixed order (ClinVar, COSMIC, IARC TP53, DOCM). A source
/// that is not configured or whose input is missing is skipped with a warning.
///
pub fn run(config: &IndexerConfig) -> Result<PipelineReport> {
    info!("Indexing clinical variants for {} into {:?}", config.assembly, config.store);
    let mut store = AssociationStore::open(&config.store)
        .with_context(|| format!("Failed to open association store {:?}", config.store))?;
    let mut report = PipelineReport::default();

    match config.clinvar.as_ref() {
        Some(clinvar) => run_clinvar(clinvar, config.assembly, &mut store, &mut report)?,
        None => warn!("ClinVar not configured, skipping"),
    }

    match config.cosmic.as_ref() {
        Some(cosmic) if input_exists(&cosmic.file, "COSMIC") => {
            let mut indexer = CosmicIndexer::from_path(&cosmic.file, config.cosmic_columns())?;
            let stats = index_source(&mut indexer, &mut store).context("COSMIC indexing failed")?;
            report.add("COSMIC", stats);
        }
        Some(_) => {}
        None => warn!("COSMIC not configured, skipping"),
    }

    match config.iarc.as_ref() {
        Some(iarc) => run_iarc(
            iarc,
            config.assembly,
            config.fasta.as_deref(),
            &mut store,
            &mut report,
        )?,
        None => warn!("IARC TP53 not configured, skipping"),
    }

    match config.docm.as_ref() {
        Some(docm) if input_exists(&docm.file, "DOCM") => {
            let mut indexer = DocmIndexer::from_path(&docm.file, config.assembly)?;
            let stats = index_source(&mut indexer, &mut store).context("DOCM indexing failed")?;
            report.add("DOCM", stats);
        }
        Some(_) => {}
        None => warn!("DOCM not configured, skipping"),
    }

    info!(
        "Indexing finished: {} records indexed, {} new variants, {} updates, {} skipped",
        report.total.indexed_records,
        report.total.new_variants,
        report.total.updated_variants,
        report.total.skipped()
    );

    if let Some(export) = config.export.as_deref() {
        report.exported = Some(store.export(export)?);
    }

    Ok(report)
}
