//! Database connection management

use crate::errors::{from_rusqlite, Result};
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::path::Path;

/// Path value selecting a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Open `path`, or an in-memory database for `:memory:`, and configure it
pub fn open_configured(path: &str) -> Result<Connection> {
    let conn = if path == IN_MEMORY {
        open_in_memory()?
    } else {
        open(path)?
    };
    configure(&conn)?;
    tracing::debug!(path, "sqlite connection opened");
    Ok(conn)
}

/// Unicode-aware lowercase, used by name search
pub const FOLD_CASE_FN: &str = "fold_case";

/// Register the scalar functions the repository queries rely on
///
/// SQLite's own `lower()` folds ASCII only. Registering again replaces the
/// previous definition.
pub fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        FOLD_CASE_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|s| s.to_lowercase()))
        },
    )
    .map_err(from_rusqlite)
}

/// Configure a connection for service use
pub fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(from_rusqlite)?;

    // journal_mode returns a row, so it cannot go through execute()
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
        .map_err(from_rusqlite)?;

    // Seeding instances sharing one file contend on the write lock
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(from_rusqlite)?;

    register_functions(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_path_opens() {
        let conn = open_configured(IN_MEMORY).unwrap();
        let one: i64 = conn.query_row("SELECT 1", [], |r| r.get(0)).unwrap();
        assert_eq!(one, 1);
    }

    #[test]
    fn test_fold_case_handles_non_ascii() {
        let conn = open_configured(IN_MEMORY).unwrap();
        let folded: String = conn
            .query_row("SELECT fold_case('ÉCOLE Ωmega')", [], |r| r.get(0))
            .unwrap();
        assert_eq!(folded, "école ωmega");
    }

    #[test]
    fn test_file_database_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decks.db");
        let conn = open_configured(path.to_str().unwrap()).unwrap();

        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |r| r.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
