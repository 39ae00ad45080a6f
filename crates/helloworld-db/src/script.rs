use rusqlite::Connection;
use tracing::{debug, error, info};

use crate::error::{MigrationError, TransactionAction};
use crate::executor::execute_statement;

/// Split a migration script into individual statements on `;`.
///
/// Scripts must not contain `;` inside comments or string literals: the split
/// is purely textual. Newlines inside a statement are folded into spaces and
/// empty fragments are dropped.
pub fn split_statements(script: &str) -> Vec<String> {
    script
        .split(';')
        .map(|candidate| candidate.replace(['\r', '\n'], " "))
        .map(|candidate| candidate.trim().to_string())
        .filter(|candidate| !candidate.is_empty())
        .collect()
}

/// Run every statement of `script` inside a single transaction.
///
/// The first failing statement rolls the whole script back and is returned
/// as [`MigrationError::Statement`]. Returns the number of statements executed
/// on commit.
pub fn run_script(conn: &Connection, script: &str, name: &str) -> Result<usize, MigrationError> {
    transaction_control(conn, name, TransactionAction::Begin)?;

    info!("executing script: {name}");
    let statements = split_statements(script);

    for (index, statement) in statements.iter().enumerate() {
        debug!("{name}[{index}]: {statement}");
        if let Err(source) = execute_statement(conn, statement) {
            error!("script {name} failed at statement {index}: {source}");
            rollback(conn, name);
            return Err(MigrationError::Statement {
                script: name.to_string(),
                index,
                statement: statement.clone(),
                source,
            });
        }
    }

    if let Err(e) = transaction_control(conn, name, TransactionAction::Commit) {
        rollback(conn, name);
        return Err(e);
    }

    info!("script {name} committed ({} statements)", statements.len());
    Ok(statements.len())
}

fn transaction_control(
    conn: &Connection,
    script: &str,
    action: TransactionAction,
) -> Result<(), MigrationError> {
    execute_statement(conn, &action.to_string()).map_err(|source| {
        error!("script {script}: {action} failed: {source}");
        MigrationError::TransactionControl {
            script: script.to_string(),
            action,
            source,
        }
    })
}

// A failed rollback is only logged; the caller already has the error that
// triggered it.
fn rollback(conn: &Connection, script: &str) {
    if transaction_control(conn, script, TransactionAction::Rollback).is_ok() {
        info!("script {script} rolled back");
    }
}
