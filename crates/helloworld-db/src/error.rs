use std::fmt;

use thiserror::Error;

/// Transaction control statement issued by the script runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionAction {
    Begin,
    Commit,
    Rollback,
}

impl fmt::Display for TransactionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Begin => "BEGIN TRANSACTION",
            Self::Commit => "COMMIT",
            Self::Rollback => "ROLLBACK",
        })
    }
}

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("script {script}: statement {index} failed ({statement}): {source}")]
    Statement {
        script: String,
        index: usize,
        statement: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("script {script}: {action} failed: {source}")]
    TransactionControl {
        script: String,
        action: TransactionAction,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to read schema version: {0}")]
    Inspect(#[source] rusqlite::Error),

    #[error("migration script not found: {0}")]
    MissingScript(String),

    #[error("step {step} did not advance the schema version (expected {expected}, found {found})")]
    NoProgress {
        step: String,
        expected: i64,
        found: i64,
    },
}

impl From<MigrationError> for helloworld_common::Error {
    fn from(e: MigrationError) -> Self {
        helloworld_common::Error::Migration(e.to_string())
    }
}
