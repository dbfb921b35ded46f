//! Reference table storage: the catalog and exception tables survive across
//! runs.
//!
//! The pipelines never read the store themselves; callers load the tables and
//! pass them in.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use orderflow_catalog::{Catalog, ExceptionIndex, ExceptionRule};
use orderflow_core::Table;

use crate::table_io::{self, TableIoError};

const MANIFEST_FILE: &str = "manifest.json";

/// The two reference tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Catalog,
    Exceptions,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 2] = [ReferenceKind::Catalog, ReferenceKind::Exceptions];

    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceKind::Catalog => "catalog",
            ReferenceKind::Exceptions => "exceptions",
        }
    }

    fn file_name(self) -> &'static str {
        match self {
            ReferenceKind::Catalog => "catalog.csv",
            ReferenceKind::Exceptions => "exceptions.csv",
        }
    }

    /// Check that `table` satisfies this kind's column contract.
    fn validate(self, table: &Table) -> Result<(), ReferenceStoreError> {
        let checked = match self {
            ReferenceKind::Catalog => Catalog::from_table(table).map(|_| ()),
            ReferenceKind::Exceptions => ExceptionRule::from_table(table).map(|_| ()),
        };
        checked.map_err(|e| ReferenceStoreError::Table(TableIoError::Domain(e)))
    }
}

impl core::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance of a stored table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub imported_at: DateTime<Utc>,
    /// Where the table was imported from (usually a file path).
    pub source: String,
    pub rows: usize,
}

/// Provenance of every stored table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub tables: BTreeMap<ReferenceKind, ManifestEntry>,
}

/// Reference store error.
#[derive(Debug, Error)]
pub enum ReferenceStoreError {
    #[error("{0} table is not available; import it first")]
    Missing(ReferenceKind),

    #[error("failed to access reference store at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt manifest {}: {source}", .path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Table(#[from] TableIoError),

    #[error("in-memory reference store is unusable after a panic")]
    Poisoned,
}

/// Reference table storage abstraction.
pub trait ReferenceStore: Send + Sync {
    /// The stored table, if one was ever imported.
    fn load(&self, kind: ReferenceKind) -> Result<Option<Table>, ReferenceStoreError>;

    /// Replace the stored table. The table must satisfy its column contract.
    fn save(
        &self,
        kind: ReferenceKind,
        table: &Table,
        source: &str,
    ) -> Result<ManifestEntry, ReferenceStoreError>;

    fn manifest(&self) -> Result<Manifest, ReferenceStoreError>;

    /// The stored table, or [`ReferenceStoreError::Missing`].
    fn require(&self, kind: ReferenceKind) -> Result<Table, ReferenceStoreError> {
        self.load(kind)?.ok_or(ReferenceStoreError::Missing(kind))
    }
}

impl<S> ReferenceStore for Arc<S>
where
    S: ReferenceStore + ?Sized,
{
    fn load(&self, kind: ReferenceKind) -> Result<Option<Table>, ReferenceStoreError> {
        (**self).load(kind)
    }

    fn save(
        &self,
        kind: ReferenceKind,
        table: &Table,
        source: &str,
    ) -> Result<ManifestEntry, ReferenceStoreError> {
        (**self).save(kind, table, source)
    }

    fn manifest(&self) -> Result<Manifest, ReferenceStoreError> {
        (**self).manifest()
    }
}

/// Directory-backed store: one CSV per table plus `manifest.json`.
#[derive(Debug, Clone)]
pub struct FsReferenceStore {
    dir: PathBuf,
}

impl FsReferenceStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ReferenceStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| ReferenceStoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn table_path(&self, kind: ReferenceKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    fn write_manifest(&self, manifest: &Manifest) -> Result<(), ReferenceStoreError> {
        let path = self.manifest_path();
        let json = serde_json::to_vec_pretty(manifest).map_err(|source| {
            ReferenceStoreError::Manifest {
                path: path.clone(),
                source,
            }
        })?;
        table_io::write_file_atomically(&path, |file| {
            use std::io::Write;
            file.write_all(&json).map_err(|source| TableIoError::Io {
                path: path.clone(),
                source,
            })
        })?;
        Ok(())
    }
}

impl ReferenceStore for FsReferenceStore {
    fn load(&self, kind: ReferenceKind) -> Result<Option<Table>, ReferenceStoreError> {
        let path = self.table_path(kind);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(table_io::read_table(&path, kind.as_str())?))
    }

    fn save(
        &self,
        kind: ReferenceKind,
        table: &Table,
        source: &str,
    ) -> Result<ManifestEntry, ReferenceStoreError> {
        kind.validate(table)?;

        table_io::write_table_file(&self.table_path(kind), table)?;

        let entry = ManifestEntry {
            imported_at: Utc::now(),
            source: source.to_string(),
            rows: table.len(),
        };
        let mut manifest = self.manifest()?;
        manifest.tables.insert(kind, entry.clone());
        self.write_manifest(&manifest)?;

        tracing::info!(
            table = %kind,
            rows = entry.rows,
            source,
            dir = %self.dir.display(),
            "stored reference table"
        );
        Ok(entry)
    }

    fn manifest(&self) -> Result<Manifest, ReferenceStoreError> {
        let path = self.manifest_path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Manifest::default()),
            Err(source) => return Err(ReferenceStoreError::Io { path, source }),
        };
        serde_json::from_slice(&bytes).map_err(|source| ReferenceStoreError::Manifest { path, source })
    }
}

/// In-memory store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryReferenceStore {
    inner: RwLock<HashMap<ReferenceKind, (Table, ManifestEntry)>>,
}

impl InMemoryReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReferenceStore for InMemoryReferenceStore {
    fn load(&self, kind: ReferenceKind) -> Result<Option<Table>, ReferenceStoreError> {
        let map = self.inner.read().map_err(|_| ReferenceStoreError::Poisoned)?;
        Ok(map.get(&kind).map(|(table, _)| table.clone()))
    }

    fn save(
        &self,
        kind: ReferenceKind,
        table: &Table,
        source: &str,
    ) -> Result<ManifestEntry, ReferenceStoreError> {
        kind.validate(table)?;
        let entry = ManifestEntry {
            imported_at: Utc::now(),
            source: source.to_string(),
            rows: table.len(),
        };
        self.inner
            .write()
            .map_err(|_| ReferenceStoreError::Poisoned)?
            .insert(kind, (table.clone(), entry.clone()));
        Ok(entry)
    }

    fn manifest(&self) -> Result<Manifest, ReferenceStoreError> {
        let map = self.inner.read().map_err(|_| ReferenceStoreError::Poisoned)?;
        Ok(Manifest {
            tables: map
                .iter()
                .map(|(kind, (_, entry))| (*kind, entry.clone()))
                .collect(),
        })
    }
}

/// Both reference tables, parsed and ready for the pipelines.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    pub catalog: Catalog,
    pub exceptions: ExceptionIndex,
}

impl ReferenceTables {
    /// Load and parse both tables for the order pipeline. Fails when either
    /// was never imported.
    pub fn load(store: &dyn ReferenceStore) -> Result<Self, ReferenceStoreError> {
        let catalog = Catalog::from_table(&store.require(ReferenceKind::Catalog)?)
            .map_err(TableIoError::from)?;
        let exceptions = ExceptionIndex::from_table(&store.require(ReferenceKind::Exceptions)?)
            .map_err(TableIoError::from)?;
        Ok(Self {
            catalog,
            exceptions,
        })
    }
}

/// Load and index the exception table for the inventory pipeline, which
/// needs its `Fix Qty` column.
pub fn load_inventory_exceptions(
    store: &dyn ReferenceStore,
) -> Result<ExceptionIndex, ReferenceStoreError> {
    let table = store.require(ReferenceKind::Exceptions)?;
    Ok(ExceptionIndex::for_inventory(&table).map_err(TableIoError::from)?)
}
