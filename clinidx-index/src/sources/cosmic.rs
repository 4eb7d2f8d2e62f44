//! COSMIC mutant export (tab-separated, one mutation observation per row).

use std::collections::BTreeSet;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::Result;
use tracing::info;

use clinidx_core::consts::{COSMIC_SOURCE, PUBMED_PREFIX};
use clinidx_core::utils::{is_missing, non_missing};
use clinidx_core::{Somatic, Strand, VariantTraitAssociation};

use crate::config::CosmicColumns;
use crate::driver::SourceIndexer;
use crate::mutation::{Alleles, Grammar, MutationParser};
use crate::position::{GenomicPosition, PositionResolver};
use crate::sources::{TsvReader, cell};
use crate::stats::{IndexingStats, SkipReason};
use crate::store::MergePolicy;

const GENE_NAME_COLUMN: usize = 0;
const HGNC_COLUMN: usize = 3;
const PRIMARY_SITE_COLUMN: usize = 7;
const SITE_SUBTYPE_COLUMN: usize = 8;
const PRIMARY_HISTOLOGY_COLUMN: usize = 11;
const HISTOLOGY_SUBTYPE_COLUMN: usize = 12;
const MUTATION_ID_COLUMN: usize = 16;
const MUTATION_CDS_COLUMN: usize = 17;
const POSITION_COLUMN: usize = 23;
const STRAND_COLUMN: usize = 24;

/// Free-text COSMIC cell with underscores turned into spaces, or `None` when missing.
fn spaced(value: &str) -> Option<String> {
    non_missing(value).map(|v| v.replace('_', " "))
}

pub struct CosmicIndexer<R: BufRead> {
    rows: TsvReader<R>,
    columns: CosmicColumns,
    resolver: PositionResolver,
    parser: MutationParser,
}

impl CosmicIndexer<BufReader<Box<dyn Read>>> {
    pub fn from_path(path: &Path, columns: CosmicColumns) -> Result<Self> {
        info!("Parsing COSMIC file {:?}", path);
        Ok(CosmicIndexer::new(TsvReader::from_path(path, true)?, columns))
    }
}

impl<R: BufRead> CosmicIndexer<R> {
    pub fn new(rows: TsvReader<R>, columns: CosmicColumns) -> Self {
        CosmicIndexer {
            rows,
            columns,
            resolver: PositionResolver::new(),
            parser: MutationParser::new(Grammar::Coding),
        }
    }

    fn gene_names(row: &[String]) -> BTreeSet<String> {
        let mut genes = BTreeSet::new();
        let gene = cell(row, GENE_NAME_COLUMN);
        if !is_missing(gene) {
            genes.insert(gene.to_string());
        }
        let hgnc = cell(row, HGNC_COLUMN);
        if !is_missing(hgnc) && !hgnc.eq_ignore_ascii_case(gene) {
            genes.insert(hgnc.to_string());
        }
        genes
    }

    pub fn build_somatic(&self, row: &[String]) -> Somatic {
        let mut bibliography = BTreeSet::new();
        let pubmed = cell(row, self.columns.pubmed);
        if !is_missing(pubmed) {
            bibliography.insert(format!("{}{}", PUBMED_PREFIX, pubmed));
        }

        Somatic {
            accession: non_missing(cell(row, MUTATION_ID_COLUMN)),
            source: Some(COSMIC_SOURCE.to_string()),
            review_status: None,
            gene_names: Self::gene_names(row),
            primary_histology: spaced(cell(row, PRIMARY_HISTOLOGY_COLUMN)),
            primary_site: spaced(cell(row, PRIMARY_SITE_COLUMN)),
            site_subtype: spaced(cell(row, SITE_SUBTYPE_COLUMN)),
            histology_subtype: spaced(cell(row, HISTOLOGY_SUBTYPE_COLUMN)),
            sample_source: spaced(cell(row, self.columns.sample_source)),
            tumour_origin: spaced(cell(row, self.columns.tumour_origin)),
            mutation_somatic_status: non_missing(cell(row, self.columns.somatic_status)),
            bibliography,
        }
    }
}

impl<R: BufRead> SourceIndexer for CosmicIndexer<R> {
    type Record = Vec<String>;

    fn name(&self) -> &'static str {
        "COSMIC"
    }

    fn merge_policy(&self) -> MergePolicy {
        MergePolicy::DedupByFieldsExceptBibliography
    }

    fn next_record(&mut self) -> Result<Option<Self::Record>> {
        self.rows.next_row()
    }

    fn parse_position(&self, record: &Self::Record) -> Result<GenomicPosition, SkipReason> {
        let mut position = self
            .resolver
            .resolve(cell(record, POSITION_COLUMN), cell(record, MUTATION_CDS_COLUMN))
            .map_err(|_| SkipReason::InvalidPosition)?;
        position.strand = cell(record, STRAND_COLUMN)
            .parse::<Strand>()
            .map_err(|_| SkipReason::InvalidPosition)?;
        Ok(position)
    }

    fn parse_mutation(
        &mut self,
        record: &Self::Record,
        position: &GenomicPosition,
    ) -> Result<Alleles, SkipReason> {
        self.parser
            .parse(cell(record, MUTATION_CDS_COLUMN), position.strand)
            .map_err(SkipReason::Mutation)
    }

    fn build_records(
        &self,
        record: &Self::Record,
        stats: &mut IndexingStats,
    ) -> VariantTraitAssociation {
        stats.somatic_records += 1;
        VariantTraitAssociation {
            germline: vec![],
            somatic: vec![self.build_somatic(record)],
        }
    }
}
