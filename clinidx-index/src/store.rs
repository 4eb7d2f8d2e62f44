//! SQLite-backed association store.
//!
//! One row per variant key; the value is the JSON-serialized
//! [`VariantTraitAssociation`]. Every upsert is a read-merge-write cycle on a
//! single connection, so the store must have exactly one writer.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use clinidx_core::utils::get_dynamic_writer;
use clinidx_core::{ClinidxError, VariantKey, VariantTraitAssociation};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS associations (
    key BLOB PRIMARY KEY,
    value TEXT NOT NULL
)
"#;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("Malformed association stored under {key}: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize association: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error(transparent)]
    Key(#[from] ClinidxError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// How incoming records are folded into an existing association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Push every incoming record.
    Append,
    /// Somatic records equal in all fields but bibliography are merged by
    /// unioning their bibliographies. Germline records are appended.
    DedupByFieldsExceptBibliography,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    New,
    Updated,
}

///
/// Fold `incoming` into `existing` according to `policy`.
///
pub fn merge(
    existing: &mut VariantTraitAssociation,
    incoming: &VariantTraitAssociation,
    policy: MergePolicy,
) {
    existing.germline.extend(incoming.germline.iter().cloned());

    match policy {
        MergePolicy::Append => existing.somatic.extend(incoming.somatic.iter().cloned()),
        MergePolicy::DedupByFieldsExceptBibliography => {
            for somatic in &incoming.somatic {
                match existing
                    .somatic
                    .iter_mut()
                    .find(|s| s.same_except_bibliography(somatic))
                {
                    Some(found) => found
                        .bibliography
                        .extend(somatic.bibliography.iter().cloned()),
                    None => existing.somatic.push(somatic.clone()),
                }
            }
        }
    }
}

#[derive(Serialize)]
struct ExportRecord<'a> {
    chromosome: &'a str,
    start: i64,
    reference: &'a str,
    alternate: &'a str,
    annotation: &'a VariantTraitAssociation,
}

pub struct AssociationStore {
    conn: Connection,
}

impl AssociationStore {
    /// Open a store file, creating it when absent.
    ///
    /// The file runs in WAL mode with `synchronous=NORMAL`, so an upsert
    /// does not fsync on commit.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory store.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> StoreResult<()> {
        self.conn.execute(SCHEMA, [])?;
        Ok(())
    }

    pub fn get(&self, key: &VariantKey) -> StoreResult<Option<VariantTraitAssociation>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM associations WHERE key = ?1",
                params![key.as_bytes()],
                |row| row.get(0),
            )
            .optional()?;

        value
            .map(|json| {
                serde_json::from_str(&json).map_err(|source| StoreError::Malformed {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    ///
    /// Merge `incoming` into the association stored under `key`, creating it
    /// when the key has not been seen before.
    ///
    pub fn upsert(
        &mut self,
        key: &VariantKey,
        incoming: &VariantTraitAssociation,
        policy: MergePolicy,
    ) -> StoreResult<UpsertOutcome> {
        let (mut association, outcome) = match self.get(key)? {
            Some(existing) => (existing, UpsertOutcome::Updated),
            None => (VariantTraitAssociation::new(), UpsertOutcome::New),
        };
        merge(&mut association, incoming, policy);

        let json = serde_json::to_string(&association).map_err(StoreError::Serialize)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO associations (key, value) VALUES (?1, ?2)",
            params![key.as_bytes(), json],
        )?;

        Ok(outcome)
    }

    pub fn len(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM associations", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    ///
    /// Visit every stored association in key order.
    ///
    pub fn for_each<F>(&self, mut visit: F) -> anyhow::Result<()>
    where
        F: FnMut(&VariantKey, &VariantTraitAssociation) -> anyhow::Result<()>,
    {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM associations ORDER BY key")?;
        let mut rows = stmt.query([])?;

        while let Some(row) = rows.next()? {
            let key = VariantKey::from(row.get::<_, Vec<u8>>(0)?);
            let json: String = row.get(1)?;
            let association: VariantTraitAssociation =
                serde_json::from_str(&json).map_err(|source| StoreError::Malformed {
                    key: key.to_string(),
                    source,
                })?;
            visit(&key, &association)?;
        }

        Ok(())
    }

    ///
    /// Write every association as one JSON object per line, gzip-compressed
    /// when `path` ends in `.gz`. Returns the number of records written.
    ///
    pub fn export(&self, path: &Path) -> anyhow::Result<u64> {
        info!("Exporting associations to {:?}", path);
        let mut writer = get_dynamic_writer(path)?;
        let mut written = 0u64;

        self.for_each(|key, association| {
            let parts = key.parts()?;
            let record = ExportRecord {
                chromosome: &parts.chromosome,
                start: parts.start,
                reference: &parts.reference,
                alternate: &parts.alternate,
                annotation: association,
            };
            serde_json::to_writer(&mut writer, &record)?;
            writeln!(writer)?;
            written += 1;
            Ok(())
        })?;

        writer
            .flush()
            .with_context(|| format!("Failed to flush export file {:?}", path))?;
        info!("{} associations exported", written);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use std::collections::BTreeSet;
    use std::io::BufRead;

    use clinidx_core::utils::get_dynamic_reader;
    use clinidx_core::{Germline, Somatic};

    fn cosmic(bibliography: &[&str]) -> VariantTraitAssociation {
        VariantTraitAssociation {
            germline: vec![],
            somatic: vec![Somatic {
                accession: Some("COSM476".to_string()),
                source: Some("cosmic".to_string()),
                gene_names: BTreeSet::from(["BRAF".to_string()]),
                primary_site: Some("skin".to_string()),
                bibliography: bibliography.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }],
        }
    }

    fn clinvar(accession: &str) -> VariantTraitAssociation {
        VariantTraitAssociation {
            germline: vec![Germline {
                accession: Some(accession.to_string()),
                source: Some("clinvar".to_string()),
                ..Default::default()
            }],
            somatic: vec![],
        }
    }

    #[fixture]
    fn store() -> AssociationStore {
        AssociationStore::open_in_memory().unwrap()
    }

    #[rstest]
    fn test_get_missing_key(store: AssociationStore) {
        let key = VariantKey::new("1", 100, "A", "T");
        assert_eq!(store.get(&key).unwrap(), None);
    }

    #[rstest]
    fn test_dedup_merges_bibliography(mut store: AssociationStore) {
        let key = VariantKey::new("7", 140453136, "A", "T");
        let policy = MergePolicy::DedupByFieldsExceptBibliography;

        let first = store.upsert(&key, &cosmic(&["PMID:1"]), policy).unwrap();
        let second = store.upsert(&key, &cosmic(&["PMID:2", "PMID:1"]), policy).unwrap();
        assert_eq!(first, UpsertOutcome::New);
        assert_eq!(second, UpsertOutcome::Updated);

        let stored = store.get(&key).unwrap().unwrap();
        assert_eq!(stored.somatic.len(), 1);
        assert_eq!(
            stored.somatic[0].bibliography,
            BTreeSet::from(["PMID:1".to_string(), "PMID:2".to_string()])
        );
    }

    #[rstest]
    fn test_dedup_keeps_distinct_records(mut store: AssociationStore) {
        let key = VariantKey::new("7", 140453136, "A", "T");
        let policy = MergePolicy::DedupByFieldsExceptBibliography;
        let mut other_site = cosmic(&["PMID:3"]);
        other_site.somatic[0].primary_site = Some("thyroid".to_string());

        store.upsert(&key, &cosmic(&["PMID:1"]), policy).unwrap();
        store.upsert(&key, &other_site, policy).unwrap();
        assert_eq!(store.get(&key).unwrap().unwrap().somatic.len(), 2);
    }

    #[rstest]
    fn test_append_never_merges(mut store: AssociationStore) {
        let key = VariantKey::new("17", 7577120, "C", "T");
        store.upsert(&key, &clinvar("RCV000000001"), MergePolicy::Append).unwrap();
        store.upsert(&key, &clinvar("RCV000000002"), MergePolicy::Append).unwrap();

        let stored = store.get(&key).unwrap().unwrap();
        let accessions: Vec<_> = stored
            .germline
            .iter()
            .map(|g| g.accession.clone().unwrap())
            .collect();
        assert_eq!(accessions, vec!["RCV000000001", "RCV000000002"]);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[rstest]
    fn test_malformed_value_is_fatal(store: AssociationStore) {
        let key = VariantKey::new("1", 1, "A", "C");
        store
            .conn
            .execute(
                "INSERT INTO associations (key, value) VALUES (?1, ?2)",
                params![key.as_bytes(), "{not json"],
            )
            .unwrap();
        assert!(matches!(store.get(&key), Err(StoreError::Malformed { .. })));
    }

    #[rstest]
    fn test_file_store_uses_wal_journal() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("assoc.db");
        let mut store = AssociationStore::open(&path).unwrap();

        let journal_mode: String = store
            .conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .unwrap();
        assert_eq!(journal_mode.to_lowercase(), "wal");
        let synchronous: i64 = store
            .conn
            .pragma_query_value(None, "synchronous", |row| row.get(0))
            .unwrap();
        assert_eq!(synchronous, 1);

        let key = VariantKey::new("1", 10, "A", "G");
        store.upsert(&key, &clinvar("RCV1"), MergePolicy::Append).unwrap();
        drop(store);

        // reopening sees what the previous handle wrote
        let reopened = AssociationStore::open(&path).unwrap();
        assert_eq!(reopened.len().unwrap(), 1);
        assert!(reopened.get(&key).unwrap().is_some());
    }

    #[rstest]
    fn test_export_writes_one_line_per_variant() {
        let tempdir = tempfile::tempdir().unwrap();
        let mut store = AssociationStore::open(&tempdir.path().join("assoc.db")).unwrap();
        store
            .upsert(&VariantKey::new("1", 10, "", "TT"), &clinvar("RCV1"), MergePolicy::Append)
            .unwrap();
        store
            .upsert(&VariantKey::new("2", 20, "A", "G"), &cosmic(&[]), MergePolicy::Append)
            .unwrap();

        let output = tempdir.path().join("export.json.gz");
        assert_eq!(store.export(&output).unwrap(), 2);

        let lines: Vec<serde_json::Value> = get_dynamic_reader(&output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(&l.unwrap()).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["chromosome"], "1");
        assert_eq!(lines[0]["reference"], "");
        assert_eq!(lines[0]["alternate"], "TT");
        assert_eq!(lines[0]["annotation"]["germline"][0]["accession"], "RCV1");
        assert_eq!(lines[1]["start"], 20);
    }
}
