//! Read-only data source adapter
//!
//! A [`DataSource`] is opened once at process start and passed by reference
//! to every render cycle. A file path opens a SQLite database read-only; a
//! directory path opens a parquet snapshot (one `<Table>.parquet` per table).
//!
//! The SQLite connection is guarded by a mutex: render cycles running on
//! different threads serialize on it, and every caller of
//! [`DataSource::connection`] gets the same connection.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OpenFlags};
use tracing::{info, info_span};

use crate::error::{DashboardError, Result};
use crate::tables::NorthwindTables;
use crate::{reader, sqlite};

#[derive(Debug)]
enum Backend {
    Sqlite(Mutex<Connection>),
    Parquet,
}

#[derive(Debug)]
pub struct DataSource {
    path: PathBuf,
    backend: Backend,
}

impl DataSource {
    /// Open the store at `path`
    ///
    /// Fails with `SourceUnavailable` when the path does not exist or the
    /// file is not a readable SQLite database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = std::fs::metadata(&path)
            .map_err(|e| DashboardError::unavailable(&path, e))?;

        let backend = if metadata.is_dir() {
            Backend::Parquet
        } else {
            Backend::Sqlite(Mutex::new(open_sqlite(&path)?))
        };

        info!(path = %path.display(), kind = backend.kind(), "opened data source");
        Ok(Self { path, backend })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Backend name, `sqlite` or `parquet`
    pub fn kind(&self) -> &'static str {
        self.backend.kind()
    }

    /// The shared SQLite connection, `None` for a parquet snapshot
    ///
    /// Holding the guard blocks other render cycles; keep it short.
    pub fn connection(&self) -> Option<MutexGuard<'_, Connection>> {
        match &self.backend {
            Backend::Sqlite(conn) => Some(lock(conn)),
            Backend::Parquet => None,
        }
    }

    /// Load a fresh snapshot of the five source tables
    pub fn load_tables(&self) -> Result<NorthwindTables> {
        let _span = info_span!("load_tables", kind = self.kind()).entered();
        let tables = match &self.backend {
            Backend::Sqlite(conn) => {
                let conn = lock(conn);
                NorthwindTables::load_with(|spec| sqlite::read_table(&conn, spec))?
            }
            Backend::Parquet => {
                NorthwindTables::load_with(|spec| reader::read_table(&self.path, spec))?
            }
        };
        info!(lines = tables.line_count(), "loaded tables");
        Ok(tables)
    }
}

impl Backend {
    fn kind(&self) -> &'static str {
        match self {
            Backend::Sqlite(_) => "sqlite",
            Backend::Parquet => "parquet",
        }
    }
}

// A poisoned lock only means another render panicked mid-read
fn lock(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(|e| e.into_inner())
}

fn open_sqlite(path: &Path) -> Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
        | OpenFlags::SQLITE_OPEN_NO_MUTEX
        | OpenFlags::SQLITE_OPEN_URI;
    let conn = Connection::open_with_flags(path, flags)
        .map_err(|e| DashboardError::unavailable(path, e))?;

    // Opening is lazy; touching the schema catches non-database files
    conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
        .map_err(|e| DashboardError::unavailable(path, e))?;
    Ok(conn)
}
