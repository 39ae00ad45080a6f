use std::fmt;

use rusqlite::Connection;
use serde::Serialize;
use tracing::error;

use crate::error::MigrationError;

const CURRENT_VERSION_SQL: &str = "SELECT MAX(version) FROM version";

/// Highest migration step recorded in the `version` tracking table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SchemaVersion(i64);

impl SchemaVersion {
    /// The tracking table does not exist yet (or holds no rows).
    pub const UNINITIALIZED: SchemaVersion = SchemaVersion(-1);

    pub const fn new(version: i64) -> Self {
        Self(version)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    pub fn is_initialized(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Read the current schema version.
///
/// A missing `version` table is the uninitialized state, not an error.
pub fn current_version(conn: &Connection) -> Result<SchemaVersion, MigrationError> {
    match conn.query_row(CURRENT_VERSION_SQL, [], |row| row.get::<_, Option<i64>>(0)) {
        Ok(Some(version)) => Ok(SchemaVersion(version)),
        Ok(None) => Ok(SchemaVersion::UNINITIALIZED),
        Err(e) if is_missing_table(&e) => Ok(SchemaVersion::UNINITIALIZED),
        Err(e) => {
            error!("failed to read schema version: {e}");
            Err(MigrationError::Inspect(e))
        }
    }
}

// SQLite reports a missing table only through the message text.
fn is_missing_table(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.starts_with("no such table")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_is_uninitialized() {
        let conn = Connection::open_in_memory().unwrap();
        let version = current_version(&conn).unwrap();
        assert_eq!(version, SchemaVersion::UNINITIALIZED);
        assert_eq!(version.get(), -1);
        assert!(!version.is_initialized());
    }

    #[test]
    fn empty_tracking_table_is_uninitialized() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE version (version INTEGER);")
            .unwrap();
        assert_eq!(current_version(&conn).unwrap(), SchemaVersion::UNINITIALIZED);
    }

    #[test]
    fn maximum_row_is_authoritative() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE version (version INTEGER);
             INSERT INTO version VALUES (0);
             INSERT INTO version VALUES (3);
             INSERT INTO version VALUES (1);",
        )
        .unwrap();
        assert_eq!(current_version(&conn).unwrap(), SchemaVersion::new(3));
    }

    #[test]
    fn version_zero_is_initialized() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE version (version INTEGER); INSERT INTO version VALUES (0);",
        )
        .unwrap();
        let version = current_version(&conn).unwrap();
        assert_eq!(version.get(), 0);
        assert!(version.is_initialized());
    }

    #[test]
    fn other_failures_are_reported() {
        let conn = Connection::open_in_memory().unwrap();
        // A `version` table without a `version` column.
        conn.execute_batch("CREATE TABLE version (id INTEGER);")
            .unwrap();
        assert!(matches!(
            current_version(&conn),
            Err(MigrationError::Inspect(_))
        ));
    }
}
