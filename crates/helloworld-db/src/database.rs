use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use helloworld_common::{Error, Result};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::migrations::ScriptSource;
use crate::migrator::{MigrationReport, Migrator};
use crate::version::{SchemaVersion, current_version};

#[cfg(unix)]
const DATA_DIR_MODE: u32 = 0o754;

/// The service's SQLite database.
///
/// Migrated once at startup, then shared with request handlers behind an
/// `Arc`. The mutex serialises access to the single connection.
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

/// A row of the `greeting` table created by the v1 migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreetingRecord {
    pub id: i64,
    pub message: String,
    pub created_at: String,
}

impl Database {
    /// Open (creating if needed) the database file, creating its parent
    /// directory first.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            ensure_data_dir(dir)?;
        }

        info!("opening database at {}", db_path.display());
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Database(format!("failed to open database: {e}")))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(db_path.to_path_buf()),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("failed to open in-memory database: {e}")))?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// File backing this database, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Database("database lock poisoned".into()))
    }

    pub fn ping(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| Error::Database(format!("ping failed: {e}")))?;
        debug!("database ping ok");
        Ok(())
    }

    pub fn migrate<S: ScriptSource>(&self, migrator: &Migrator<S>) -> Result<MigrationReport> {
        self.ping()?;
        let conn = self.connection()?;
        Ok(migrator.run(&conn)?)
    }

    pub fn schema_version(&self) -> Result<SchemaVersion> {
        let conn = self.connection()?;
        Ok(current_version(&conn)?)
    }

    pub fn greetings(&self) -> Result<Vec<GreetingRecord>> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare("SELECT id, message, created_at FROM greeting ORDER BY id ASC")
            .map_err(|e| Error::Database(format!("failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(GreetingRecord {
                    id: row.get(0)?,
                    message: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })
            .map_err(|e| Error::Database(format!("failed to query greetings: {e}")))?;

        let mut greetings = Vec::new();
        for row in rows {
            greetings.push(
                row.map_err(|e| Error::Database(format!("failed to read greeting row: {e}")))?,
            );
        }
        Ok(greetings)
    }
}

fn ensure_data_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        return Ok(());
    }
    info!("creating directory: {}", dir.display());

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(DATA_DIR_MODE)
            .create(dir)?;
    }
    #[cfg(not(unix))]
    std::fs::create_dir_all(dir)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrator::FailurePolicy;

    #[test]
    fn open_creates_missing_directory_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("helloworldapp").join("helloworldapp.db");

        let db = Database::open(&db_path).unwrap();
        assert!(db_path.exists());
        assert_eq!(db.path(), Some(db_path.as_path()));
    }

    #[cfg(unix)]
    #[test]
    fn data_directory_gets_restricted_mode() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("app");
        Database::open(&dir.join("app.db")).unwrap();

        let mode = std::fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
        // umask can only remove bits.
        assert_eq!(mode & !DATA_DIR_MODE, 0);
    }

    #[test]
    fn fresh_database_reports_uninitialized() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.schema_version().unwrap(), SchemaVersion::UNINITIALIZED);
    }

    #[test]
    fn migrate_then_query_greetings() {
        let db = Database::in_memory().unwrap();
        let report = db.migrate(&Migrator::embedded()).unwrap();
        assert_eq!(report.final_version, SchemaVersion::new(1));

        let greetings = db.greetings().unwrap();
        assert_eq!(greetings.len(), 1);
        assert_eq!(greetings[0].message, "Hello World");
    }

    #[test]
    fn greetings_fail_on_unmigrated_schema() {
        let db = Database::in_memory().unwrap();
        let err = db.greetings().unwrap_err();
        assert!(err.to_string().contains("no such table: greeting"));
    }

    #[test]
    fn migrations_persist_across_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("app.db");

        {
            let db = Database::open(&db_path).unwrap();
            db.migrate(&Migrator::embedded()).unwrap();
        }

        let db = Database::open(&db_path).unwrap();
        let report = db
            .migrate(&Migrator::embedded().with_failure_policy(FailurePolicy::Abort))
            .unwrap();
        assert!(report.applied.is_empty());
        assert_eq!(report.starting_version, SchemaVersion::new(1));
    }

    #[test]
    fn migration_errors_convert_to_common_error() {
        use std::collections::HashMap;

        let db = Database::in_memory().unwrap();
        let migrator = Migrator::new(
            HashMap::<String, String>::new(),
            crate::migrations::MIGRATION_STEPS.to_vec(),
        );
        let err = db.migrate(&migrator).unwrap_err();
        assert!(matches!(err, Error::Migration(_)));
    }
}
