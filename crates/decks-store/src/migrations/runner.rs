//! Migration runner
//!
//! Applies embedded migrations in order, once each. A migration that was
//! already applied must still match its recorded checksum.

use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, Result};
use crate::migrations::checksums::compute_checksum;
use crate::migrations::embedded::get_migrations;
use rusqlite::{Connection, OptionalExtension};

/// Apply all pending migrations to the database
pub fn apply_migrations(conn: &mut Connection) -> Result<()> {
    create_schema_version_table(conn)?;

    for migration in get_migrations() {
        apply_migration(conn, migration.id, migration.sql)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY,
            migration_id TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL,
            checksum TEXT
        )",
        [],
    )
    .map_err(from_rusqlite)?;

    Ok(())
}

fn apply_migration(conn: &mut Connection, migration_id: &str, sql: &str) -> Result<()> {
    let checksum = compute_checksum(sql);

    let tx = conn.transaction().map_err(from_rusqlite)?;

    let recorded: Option<Option<String>> = tx
        .query_row(
            "SELECT checksum FROM schema_version WHERE migration_id = ?",
            [migration_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)?;

    match recorded {
        Some(Some(recorded)) if recorded != checksum => {
            return Err(checksum_mismatch(migration_id, &recorded, &checksum));
        }
        Some(_) => return Ok(()),
        None => {}
    }

    tx.execute_batch(sql)
        .map_err(|e| migration_error(migration_id, &e.to_string()))?;

    let now = chrono::Utc::now().timestamp();
    tx.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES (?, ?, ?)",
        rusqlite::params![migration_id, now, checksum],
    )
    .map_err(from_rusqlite)?;

    tx.commit().map_err(from_rusqlite)?;

    tracing::debug!(migration_id, "migration applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applied(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT migration_id FROM schema_version ORDER BY id")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<String>>>()
            .unwrap()
    }

    #[test]
    fn test_decks_table_created_once() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        apply_migrations(&mut conn).unwrap();

        assert_eq!(applied(&conn), vec!["001_decks"]);
        conn.execute("INSERT INTO decks (id, name, created_at, updated_at) VALUES ('d1', 'x', 0, 0)", [])
            .unwrap();
    }

    #[test]
    fn test_failed_migration_leaves_no_record() {
        let mut conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();

        let err = apply_migration(&mut conn, "999_broken", "CREATE TABLE oops (").unwrap_err();
        assert_eq!(err.entity_id(), Some("999_broken"));
        assert!(applied(&conn).is_empty());
    }
}
