use rusqlite::Connection;

/// Prepare and run exactly one SQL statement.
///
/// The statement must not produce rows and must not be followed by another
/// statement in the same string; rusqlite rejects both.
pub fn execute_statement(conn: &Connection, sql: &str) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(sql)?;
    stmt.execute([])?;
    Ok(())
}
