//! IARC TP53 germline and somatic mutation tables.
//!
//! Both files list one row per observation (individual or tumour sample) and
//! repeat the variant on consecutive rows. Consecutive rows sharing a variant
//! id are read as one group, located once and written once.

use std::collections::BTreeSet;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use clinidx_core::consts::IARC_TP53_SOURCE;
use clinidx_core::utils::non_missing;
use clinidx_core::{Germline, Somatic, VariantTraitAssociation};

use crate::config::Assembly;
use crate::driver::SourceIndexer;
use crate::fasta::SequenceLookup;
use crate::mutation::{
    Alleles, DeletionTail, Grammar, MutationError, MutationKind, MutationParser, deletion_tail,
    is_numeric,
};
use crate::position::GenomicPosition;
use crate::sources::{TsvReader, cell};
use crate::stats::{IndexingStats, SkipReason};
use crate::store::MergePolicy;
use crate::xref::ReferenceMap;

const TP53_CHROMOSOME: &str = "17";
const TP53_GENE: &str = "TP53";

// germline-only columns
const DISEASE_COLUMN: usize = 51;
const INHERITANCE_COLUMN: usize = 44;

// somatic-only columns; site subtype and tumour origin share column 33 in the export
const SAMPLE_SOURCE_COLUMN: usize = 32;
const SITE_SUBTYPE_COLUMN: usize = 33;
const TUMOUR_ORIGIN_COLUMN: usize = 33;
const PRIMARY_SITE_COLUMN: usize = 34;
const HISTOLOGY_SUBTYPE_COLUMN: usize = 38;

///
/// Column layout of one IARC TP53 table. The germline and somatic files carry
/// the same information at different offsets.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IarcLayout {
    pub germline: bool,
    pub variant_id: usize,
    pub start_grch37: usize,
    pub start_grch38: usize,
    pub size_description: usize,
    pub g_description: usize,
    pub bibliography: usize,
    /// PubMed column of the companion references file.
    pub references_pubmed: usize,
}

impl IarcLayout {
    pub fn germline() -> Self {
        IarcLayout {
            germline: true,
            variant_id: 9,
            start_grch37: 11,
            start_grch38: 12,
            size_description: 17,
            g_description: 19,
            bibliography: 53,
            references_pubmed: 8,
        }
    }

    pub fn somatic() -> Self {
        IarcLayout {
            germline: false,
            variant_id: 1,
            start_grch37: 3,
            start_grch38: 4,
            size_description: 10,
            g_description: 10,
            bibliography: 64,
            references_pubmed: 9,
        }
    }

    pub fn kind(&self) -> &'static str {
        if self.germline { "germline" } else { "somatic" }
    }

    fn start_column(&self, assembly: Assembly) -> usize {
        match assembly {
            Assembly::GRCh37 => self.start_grch37,
            Assembly::GRCh38 => self.start_grch38,
        }
    }
}

/// Rows of one variant, in file order. Never empty.
pub type IarcGroup = Vec<Vec<String>>;

fn inheritance_model(tag: &str) -> Option<&'static str> {
    match tag.trim() {
        "P" => Some("paternal"),
        "M" => Some("maternal"),
        "P&M" => Some("maternal and paternal"),
        "de novo" => Some("de novo"),
        "na" => Some("not known"),
        _ => None,
    }
}

fn is_size_suffixed(size: &str, suffix: &str) -> bool {
    size.len() > suffix.len()
        && size[size.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
        && is_numeric(&size[..size.len() - suffix.len()])
}

///
/// End coordinate implied by the size description. Deletions sized in kb or
/// Mb are not resolved.
///
fn end_position(start: i64, size_description: &str) -> Option<i64> {
    match MutationKind::classify(size_description) {
        MutationKind::Deletion => {
            let parts: Vec<&str> = size_description.split("del").collect();
            if parts.len() != 2 || parts[1].is_empty() {
                warn!("Deletion format not recognized: {:?}", size_description);
                return None;
            }
            let size = parts[1];
            if is_numeric(size) {
                let length = size.parse::<i64>().ok()?;
                start.checked_add(length - 1)
            } else if is_size_suffixed(size, "kb") || is_size_suffixed(size, "mb") {
                None
            } else if size.bytes().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T')) {
                start.checked_add(size.len() as i64 - 1)
            } else {
                warn!("Deletion size format not recognized: {:?}", size);
                None
            }
        }
        MutationKind::Insertion => Some(start - 1),
        _ => Some(start),
    }
}

pub struct IarcTp53Indexer<R: BufRead> {
    rows: TsvReader<R>,
    layout: IarcLayout,
    assembly: Assembly,
    references: ReferenceMap,
    sequence: Option<Box<dyn SequenceLookup>>,
    parser: MutationParser,
    pending: Option<Vec<String>>,
}

impl IarcTp53Indexer<BufReader<Box<dyn Read>>> {
    pub fn from_paths(
        path: &Path,
        references_path: &Path,
        layout: IarcLayout,
        assembly: Assembly,
        sequence: Option<Box<dyn SequenceLookup>>,
    ) -> Result<Self> {
        let references = ReferenceMap::from_file(references_path, layout.references_pubmed)?;
        info!("Parsing IARC TP53 {} file {:?}", layout.kind(), path);
        Ok(IarcTp53Indexer::new(
            TsvReader::from_path(path, true)?,
            layout,
            assembly,
            references,
            sequence,
        ))
    }
}

impl<R: BufRead> IarcTp53Indexer<R> {
    pub fn new(
        rows: TsvReader<R>,
        layout: IarcLayout,
        assembly: Assembly,
        references: ReferenceMap,
        sequence: Option<Box<dyn SequenceLookup>>,
    ) -> Self {
        if sequence.is_none() {
            warn!("No reference sequence configured; length-only IARC TP53 deletions will be skipped");
        }
        IarcTp53Indexer {
            rows,
            layout,
            assembly,
            references,
            sequence,
            parser: MutationParser::new(Grammar::Genomic),
            pending: None,
        }
    }

    /// Hand back the sequence lookup so the next table can reuse it.
    pub fn into_sequence(self) -> Option<Box<dyn SequenceLookup>> {
        self.sequence
    }

    fn bibliography(&self, row: &[String], stats: &mut IndexingStats) -> BTreeSet<String> {
        let mut bibliography = BTreeSet::new();
        let reference_id = cell(row, self.layout.bibliography).trim();
        if reference_id.is_empty() || reference_id.eq_ignore_ascii_case("na") {
            return bibliography;
        }
        match self.references.get(reference_id) {
            Some(pmid) => {
                bibliography.insert(pmid.to_string());
            }
            None => stats.missing_references += 1,
        }
        bibliography
    }

    pub fn build_germline(&self, row: &[String], stats: &mut IndexingStats) -> Germline {
        Germline {
            accession: non_missing(cell(row, self.layout.variant_id)),
            source: Some(IARC_TP53_SOURCE.to_string()),
            disease: non_missing(cell(row, DISEASE_COLUMN)).into_iter().collect(),
            inheritance_model: inheritance_model(cell(row, INHERITANCE_COLUMN))
                .map(str::to_string)
                .into_iter()
                .collect(),
            gene_names: BTreeSet::from([TP53_GENE.to_string()]),
            bibliography: self.bibliography(row, stats),
            ..Germline::default()
        }
    }

    pub fn build_somatic(&self, row: &[String], stats: &mut IndexingStats) -> Somatic {
        Somatic {
            accession: non_missing(cell(row, self.layout.variant_id)),
            source: Some(IARC_TP53_SOURCE.to_string()),
            primary_site: non_missing(cell(row, PRIMARY_SITE_COLUMN)),
            site_subtype: non_missing(cell(row, SITE_SUBTYPE_COLUMN)),
            histology_subtype: non_missing(cell(row, HISTOLOGY_SUBTYPE_COLUMN)),
            sample_source: non_missing(cell(row, SAMPLE_SOURCE_COLUMN)),
            tumour_origin: non_missing(cell(row, TUMOUR_ORIGIN_COLUMN)),
            gene_names: BTreeSet::from([TP53_GENE.to_string()]),
            bibliography: self.bibliography(row, stats),
            ..Somatic::default()
        }
    }

    fn deleted_bases(&mut self, position: &GenomicPosition) -> Result<String, SkipReason> {
        let Some(sequence) = self.sequence.as_mut() else {
            return Err(SkipReason::SequenceLookup);
        };
        sequence
            .fetch(&position.chromosome, position.start, position.end)
            .map_err(|e| {
                warn!("Reference lookup failed for {}:{}-{}: {}", position.chromosome, position.start, position.end, e);
                SkipReason::SequenceLookup
            })
    }
}

impl<R: BufRead> SourceIndexer for IarcTp53Indexer<R> {
    type Record = IarcGroup;

    fn name(&self) -> &'static str {
        "IARC TP53"
    }

    fn merge_policy(&self) -> MergePolicy {
        MergePolicy::Append
    }

    fn next_record(&mut self) -> Result<Option<Self::Record>> {
        let first = match self.pending.take() {
            Some(row) => row,
            None => match self.rows.next_row()? {
                Some(row) => row,
                None => return Ok(None),
            },
        };

        let id = cell(&first, self.layout.variant_id).to_string();
        let mut group = vec![first];
        while let Some(row) = self.rows.next_row()? {
            if cell(&row, self.layout.variant_id) == id {
                group.push(row);
            } else {
                self.pending = Some(row);
                break;
            }
        }
        Ok(Some(group))
    }

    fn parse_position(&self, record: &Self::Record) -> Result<GenomicPosition, SkipReason> {
        let row = record.first().ok_or(SkipReason::Malformed)?;
        let start = cell(row, self.layout.start_column(self.assembly))
            .trim()
            .parse::<i64>()
            .map_err(|_| SkipReason::InvalidPosition)?;
        let end = end_position(start, cell(row, self.layout.size_description))
            .ok_or(SkipReason::InvalidPosition)?;
        Ok(GenomicPosition::new(TP53_CHROMOSOME, start, end))
    }

    fn parse_mutation(
        &mut self,
        record: &Self::Record,
        position: &GenomicPosition,
    ) -> Result<Alleles, SkipReason> {
        let row = record.first().ok_or(SkipReason::Malformed)?;
        let description = cell(row, self.layout.g_description).to_string();

        match MutationKind::classify(&description) {
            MutationKind::Deletion => {
                if let DeletionTail::Length(_) =
                    deletion_tail(&description).map_err(SkipReason::Mutation)?
                {
                    let reference = self.deleted_bases(position)?;
                    return Ok(Alleles::new(reference, ""));
                }
            }
            MutationKind::Duplication => {
                warn!("Duplication found in IARC TP53 file: {}. Variant will be skipped", description);
                return Err(SkipReason::Mutation(MutationError::UnsupportedDuplication));
            }
            _ => {}
        }

        self.parser
            .parse(&description, position.strand)
            .map_err(SkipReason::Mutation)
    }

    fn build_records(
        &self,
        record: &Self::Record,
        stats: &mut IndexingStats,
    ) -> VariantTraitAssociation {
        let mut association = VariantTraitAssociation::new();
        for row in record {
            if self.layout.germline {
                association.germline.push(self.build_germline(row, stats));
                stats.germline_records += 1;
            } else {
                association.somatic.push(self.build_somatic(row, stats));
                stats.somatic_records += 1;
            }
        }
        association
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Cursor;

    use crate::fasta::{FastaError, FastaResult};

    /// chr17 stand-in: position 1 is 'A', then the pattern repeats.
    struct RepeatLookup;

    impl SequenceLookup for RepeatLookup {
        fn fetch(&mut self, chromosome: &str, start: i64, end: i64) -> FastaResult<String> {
            if chromosome != "17" {
                return Err(FastaError::MissingSequence(chromosome.to_string()));
            }
            Ok((start..=end)
                .map(|p| ['A', 'C', 'G', 'T'][((p - 1) % 4) as usize])
                .collect())
        }
    }

    fn row(cells: &[(usize, &str)]) -> Vec<String> {
        let mut row = vec![String::new(); 66];
        for (i, v) in cells {
            row[*i] = v.to_string();
        }
        row
    }

    fn to_tsv(rows: &[Vec<String>]) -> String {
        let mut text = String::from("header\n");
        for r in rows {
            text.push_str(&r.join("\t"));
            text.push('\n');
        }
        text
    }

    fn indexer(
        layout: IarcLayout,
        rows: &[Vec<String>],
        sequence: Option<Box<dyn SequenceLookup>>,
    ) -> IarcTp53Indexer<Cursor<String>> {
        IarcTp53Indexer::new(
            TsvReader::new(Cursor::new(to_tsv(rows)), true),
            layout,
            Assembly::GRCh37,
            ReferenceMap::default(),
            sequence,
        )
    }

    fn somatic_row(id: &str, start: &str, description: &str) -> Vec<String> {
        row(&[(1, id), (3, start), (10, description), (34, "breast"), (33, "NS")])
    }

    #[rstest]
    #[case("g.7577120C>T", Some(100))]
    #[case("g.7577120_7577125del6", Some(105))]
    #[case("g.7577120delTC", Some(101))]
    #[case("g.7577120del5kb", None)]
    #[case("g.7577120del2MB", None)]
    #[case("g.7577120_7577121insA", Some(99))]
    #[case("g.7577120delX", None)]
    #[case("g.7577120del9223372036854775807", None)]
    #[case("g.7577120del99999999999999999999", None)]
    fn test_end_position(#[case] description: &str, #[case] expected: Option<i64>) {
        assert_eq!(end_position(100, description), expected);
    }

    #[rstest]
    fn test_groups_contiguous_ids() {
        let rows = vec![
            somatic_row("1", "100", "g.100C>T"),
            somatic_row("1", "100", "g.100C>T"),
            somatic_row("2", "200", "g.200G>A"),
            somatic_row("1", "100", "g.100C>T"),
        ];
        let mut iarc = indexer(IarcLayout::somatic(), &rows, None);

        let sizes: Vec<usize> = std::iter::from_fn(|| iarc.next_record().unwrap())
            .map(|g| g.len())
            .collect();
        assert_eq!(sizes, vec![2, 1, 1]);
    }

    #[rstest]
    fn test_numeric_deletion_uses_sequence_lookup() {
        let rows = vec![somatic_row("7", "5", "g.5_7del3")];
        let mut iarc = indexer(IarcLayout::somatic(), &rows, Some(Box::new(RepeatLookup)));
        let group = iarc.next_record().unwrap().unwrap();

        let locations = iarc.locate(&group).unwrap();
        assert_eq!(locations[0].chromosome, "17");
        assert_eq!((locations[0].start, locations[0].end), (5, 7));
        assert_eq!(locations[0].reference, "ACG");
        assert_eq!(locations[0].alternate, "");
    }

    #[rstest]
    fn test_numeric_deletion_without_sequence_is_skipped() {
        let rows = vec![somatic_row("7", "5", "g.5_7del3")];
        let mut iarc = indexer(IarcLayout::somatic(), &rows, None);
        let group = iarc.next_record().unwrap().unwrap();
        assert_eq!(iarc.locate(&group), Err(SkipReason::SequenceLookup));
    }

    #[rstest]
    #[case("g.5dupA", SkipReason::Mutation(MutationError::UnsupportedDuplication))]
    #[case("g.5del3kb", SkipReason::InvalidPosition)]
    #[case("g.5del9223372036854775807", SkipReason::InvalidPosition)]
    #[case("g.5C>N", SkipReason::Mutation(MutationError::InvalidSubstitution))]
    #[case("c.5C>T", SkipReason::Mutation(MutationError::InvalidSubstitution))]
    fn test_locate_failures(#[case] description: &str, #[case] expected: SkipReason) {
        let rows = vec![somatic_row("9", "5", description)];
        let mut iarc = indexer(IarcLayout::somatic(), &rows, Some(Box::new(RepeatLookup)));
        let group = iarc.next_record().unwrap().unwrap();
        assert_eq!(iarc.locate(&group), Err(expected));
    }

    #[rstest]
    fn test_germline_records_per_row() {
        let base = [(9, "12"), (11, "7577120"), (17, "g.7577120C>T"), (19, "g.7577120C>T")];
        let mut first = row(&base);
        first[DISEASE_COLUMN] = "Li-Fraumeni syndrome".to_string();
        first[INHERITANCE_COLUMN] = "P&M".to_string();
        first[53] = "r1".to_string();
        let mut second = row(&base);
        second[INHERITANCE_COLUMN] = "na".to_string();
        second[53] = "r404".to_string();

        let mut iarc = indexer(IarcLayout::germline(), &[first, second], None);
        iarc.references = {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("refs.tsv");
            std::fs::write(&path, "id\ta\tb\tc\td\te\tf\tg\tpubmed\nr1\t\t\t\t\t\t\t\t1234\n").unwrap();
            ReferenceMap::from_file(&path, 8).unwrap()
        };

        let group = iarc.next_record().unwrap().unwrap();
        let mut stats = IndexingStats::new();
        let association = iarc.build_records(&group, &mut stats);

        assert_eq!(association.germline.len(), 2);
        assert!(association.somatic.is_empty());
        assert_eq!(stats.germline_records, 2);
        assert_eq!(stats.missing_references, 1);

        let g = &association.germline[0];
        assert_eq!(g.accession.as_deref(), Some("12"));
        assert_eq!(g.source.as_deref(), Some("iarctp53"));
        assert_eq!(g.disease, BTreeSet::from(["Li-Fraumeni syndrome".to_string()]));
        assert_eq!(g.inheritance_model, BTreeSet::from(["maternal and paternal".to_string()]));
        assert_eq!(g.bibliography, BTreeSet::from(["PMID:1234".to_string()]));
        assert_eq!(
            association.germline[1].inheritance_model,
            BTreeSet::from(["not known".to_string()])
        );
    }

    #[rstest]
    fn test_somatic_record_fields() {
        let mut r = somatic_row("3", "100", "g.100C>T");
        r[SAMPLE_SOURCE_COLUMN] = "surgery".to_string();
        r[HISTOLOGY_SUBTYPE_COLUMN] = "ductal carcinoma".to_string();
        r[64] = "na".to_string();
        let iarc = indexer(IarcLayout::somatic(), &[], None);

        let mut stats = IndexingStats::new();
        let somatic = iarc.build_somatic(&r, &mut stats);
        assert_eq!(somatic.primary_site.as_deref(), Some("breast"));
        assert_eq!(somatic.site_subtype, None);
        assert_eq!(somatic.sample_source.as_deref(), Some("surgery"));
        assert_eq!(somatic.histology_subtype.as_deref(), Some("ductal carcinoma"));
        assert!(somatic.bibliography.is_empty());
        assert_eq!(stats.missing_references, 0);
    }
}
