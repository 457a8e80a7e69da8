//! libSQL storage for the docset lookup index (`docSet.dsidx`).
//!
//! The [`IndexStore`] wraps the `searchIndex` table the docset browser reads.
//! Rows are unique on `(name, type, path)`; duplicates are ignored on insert.
//!
//! **Access rules:**
//! - build stage: read-write via [`IndexStore::open`]
//! - validation: read-only via [`IndexStore::open_readonly`]

mod migrations;

use std::path::Path;

use cdkdocset_shared::{DocsetError, Entry, EntryType, Result};
use libsql::{Connection, Database, params};
use tracing::{debug, info, instrument};

/// Handle to a docset index database.
pub struct IndexStore {
    /// Keeps the `Database` alive for `conn`.
    _db: Database,
    conn: Connection,
    readonly: bool,
}

fn storage_err(e: libsql::Error) -> DocsetError {
    DocsetError::Storage(e.to_string())
}

impl IndexStore {
    /// Open or create the index at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DocsetError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let store = Self {
            _db: db,
            conn,
            readonly: false,
        };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Open an existing index at `path` without writing to it.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DocsetError::Storage(format!(
                "index not found: {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        Ok(Self {
            _db: db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        DocsetError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 on a fresh database.
    async fn schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => match rows.next().await {
                Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
                _ => 0,
            },
            Err(_) => 0,
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(DocsetError::Storage(
                "index is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    /// Insert `entries`, ignoring rows that already exist.
    ///
    /// Runs in one transaction and returns how many rows were actually added.
    #[instrument(skip_all, fields(entries = entries.len()))]
    pub async fn upsert_entries(&self, entries: &[Entry]) -> Result<usize> {
        self.check_writable()?;
        if entries.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction().await.map_err(storage_err)?;
        let mut inserted = 0u64;
        for entry in entries {
            inserted += tx
                .execute(
                    "INSERT OR IGNORE INTO searchIndex (name, type, path) VALUES (?1, ?2, ?3)",
                    params![
                        entry.name.as_str(),
                        entry.entry_type.as_str(),
                        entry.relative_path.as_str(),
                    ],
                )
                .await
                .map_err(storage_err)?;
        }
        tx.commit().await.map_err(storage_err)?;

        debug!(inserted, ignored = entries.len() as u64 - inserted, "index updated");
        Ok(inserted as usize)
    }

    /// Number of rows in the index.
    pub async fn count_entries(&self) -> Result<usize> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM searchIndex", params![])
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(row.get::<i64>(0).map_err(storage_err)? as usize),
            None => Ok(0),
        }
    }

    /// All rows, ordered by name, type and path.
    pub async fn list_entries(&self) -> Result<Vec<Entry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT name, type, path FROM searchIndex ORDER BY name, type, path",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            entries.push(row_to_entry(&row)?);
        }
        Ok(entries)
    }
}

fn row_to_entry(row: &libsql::Row) -> Result<Entry> {
    let name: String = row.get(0).map_err(storage_err)?;
    let type_str: String = row.get(1).map_err(storage_err)?;
    let path: String = row.get(2).map_err(storage_err)?;
    let entry_type: EntryType = type_str.parse().map_err(DocsetError::Storage)?;
    Ok(Entry::new(name, entry_type, path))
}
