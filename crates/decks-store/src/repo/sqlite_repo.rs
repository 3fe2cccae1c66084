//! SQLite repository for decks
//!
//! Stateless functions over a borrowed connection, so callers decide how the
//! connection is shared and which calls run inside one transaction.

use crate::db::register_functions;
use crate::errors::{corrupt_column, encode_error, from_rusqlite, Result};
use decks_core::model::{Deck, DeckPatch};
use decks_core::query::{DeckFilter, FindOptions};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, Row};

const SELECT_DECK: &str = "SELECT id, name, white_cards, black_cards FROM decks";

/// Repository for the `decks` table
pub struct DeckRepo;

struct RawDeck {
    id: String,
    name: String,
    white_cards: String,
    black_cards: String,
}

impl RawDeck {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            white_cards: row.get(2)?,
            black_cards: row.get(3)?,
        })
    }

    fn decode(self) -> Result<Deck> {
        let white_cards = serde_json::from_str(&self.white_cards)
            .map_err(|e| corrupt_column(&self.id, "white_cards", e))?;
        let black_cards = serde_json::from_str(&self.black_cards)
            .map_err(|e| corrupt_column(&self.id, "black_cards", e))?;
        Ok(Deck {
            id: self.id,
            name: self.name,
            white_cards,
            black_cards,
        })
    }
}

fn encode_list(ids: &[String]) -> Result<String> {
    serde_json::to_string(ids).map_err(encode_error)
}

/// Make sure the functions a filter's SQL calls exist on `conn`
fn prepare_filter(conn: &Connection, filter: &DeckFilter) -> Result<()> {
    if filter.search.is_some() {
        register_functions(conn)?;
    }
    Ok(())
}

/// WHERE clause and bound parameters for a filter
fn where_clause(filter: &DeckFilter) -> (String, Vec<SqlValue>) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    if let Some(id) = &filter.id {
        conditions.push("id = ?");
        params.push(SqlValue::Text(id.clone()));
    }
    if let Some(name) = &filter.name {
        conditions.push("name = ?");
        params.push(SqlValue::Text(name.clone()));
    }
    if let Some(search) = &filter.search {
        conditions.push("instr(fold_case(name), fold_case(?)) > 0");
        params.push(SqlValue::Text(search.clone()));
    }

    if conditions.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), params)
    }
}

fn query_decks(conn: &Connection, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Deck>> {
    let mut stmt = conn.prepare(sql).map_err(from_rusqlite)?;
    let raw = stmt
        .query_map(rusqlite::params_from_iter(params), RawDeck::from_row)
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    raw.into_iter().map(RawDeck::decode).collect()
}

impl DeckRepo {
    /// Insert a new deck
    ///
    /// Fails with a persistence error if the id is taken.
    pub fn insert(conn: &Connection, deck: &Deck) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO decks (id, name, white_cards, black_cards, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            rusqlite::params![
                deck.id,
                deck.name,
                encode_list(&deck.white_cards)?,
                encode_list(&deck.black_cards)?,
                now,
            ],
        )
        .map_err(from_rusqlite)?;

        tracing::debug!(deck_id = %deck.id, "deck inserted");
        Ok(())
    }

    /// Insert unless a deck with the same id exists
    ///
    /// Returns whether a row was written.
    pub fn insert_if_absent(conn: &Connection, deck: &Deck) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();
        let written = conn
            .execute(
                "INSERT INTO decks (id, name, white_cards, black_cards, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(id) DO NOTHING",
                rusqlite::params![
                    deck.id,
                    deck.name,
                    encode_list(&deck.white_cards)?,
                    encode_list(&deck.black_cards)?,
                    now,
                ],
            )
            .map_err(from_rusqlite)?;

        tracing::debug!(deck_id = %deck.id, written = written > 0, "deck insert-if-absent");
        Ok(written > 0)
    }

    pub fn get(conn: &Connection, deck_id: &str) -> Result<Option<Deck>> {
        let raw = conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_DECK),
                [deck_id],
                RawDeck::from_row,
            )
            .optional()
            .map_err(from_rusqlite)?;

        raw.map(RawDeck::decode).transpose()
    }

    /// Fetch several decks, in the order of `ids`, skipping unknown ids
    pub fn get_many(conn: &Connection, ids: &[String]) -> Result<Vec<Deck>> {
        let mut decks = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(deck) = Self::get(conn, id)? {
                decks.push(deck);
            }
        }
        Ok(decks)
    }

    /// Filtered, sorted, windowed read
    ///
    /// Without explicit sort keys rows come back in insertion order.
    pub fn find(conn: &Connection, options: &FindOptions) -> Result<Vec<Deck>> {
        prepare_filter(conn, &options.filter)?;
        let (where_sql, mut params) = where_clause(&options.filter);

        let mut order: Vec<String> = options
            .sort
            .iter()
            .map(|key| {
                format!(
                    "{} {}",
                    key.field.column(),
                    if key.descending { "DESC" } else { "ASC" }
                )
            })
            .collect();
        order.push("rowid ASC".to_string());

        let mut sql = format!("{}{} ORDER BY {}", SELECT_DECK, where_sql, order.join(", "));

        // SQLite needs a LIMIT for OFFSET; -1 means unbounded
        sql.push_str(" LIMIT ? OFFSET ?");
        params.push(SqlValue::Integer(
            options.limit.map(i64::from).unwrap_or(-1),
        ));
        params.push(SqlValue::Integer(i64::from(options.offset)));

        query_decks(conn, &sql, params)
    }

    pub fn count(conn: &Connection, filter: &DeckFilter) -> Result<u64> {
        prepare_filter(conn, filter)?;
        let (where_sql, params) = where_clause(filter);
        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM decks{}", where_sql),
                rusqlite::params_from_iter(params),
                |row| row.get(0),
            )
            .map_err(from_rusqlite)?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Apply a patch and return the stored result
    ///
    /// Returns `None` if the deck does not exist.
    pub fn update(conn: &mut Connection, deck_id: &str, patch: DeckPatch) -> Result<Option<Deck>> {
        let tx = conn.transaction().map_err(from_rusqlite)?;

        let Some(mut deck) = Self::get(&tx, deck_id)? else {
            return Ok(None);
        };
        deck.apply(patch);

        tx.execute(
            "UPDATE decks SET name = ?1, white_cards = ?2, black_cards = ?3, updated_at = ?4
             WHERE id = ?5",
            rusqlite::params![
                deck.name,
                encode_list(&deck.white_cards)?,
                encode_list(&deck.black_cards)?,
                chrono::Utc::now().timestamp(),
                deck.id,
            ],
        )
        .map_err(from_rusqlite)?;

        tx.commit().map_err(from_rusqlite)?;

        tracing::debug!(deck_id, "deck updated");
        Ok(Some(deck))
    }

    /// Delete a deck, returning the record as it was
    pub fn remove(conn: &mut Connection, deck_id: &str) -> Result<Option<Deck>> {
        let tx = conn.transaction().map_err(from_rusqlite)?;

        let Some(deck) = Self::get(&tx, deck_id)? else {
            return Ok(None);
        };
        tx.execute("DELETE FROM decks WHERE id = ?", [deck_id])
            .map_err(from_rusqlite)?;

        tx.commit().map_err(from_rusqlite)?;

        tracing::debug!(deck_id, "deck removed");
        Ok(Some(deck))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::apply_migrations;

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        conn
    }

    #[test]
    fn test_where_clause_empty_filter() {
        let (sql, params) = where_clause(&DeckFilter::default());
        assert!(sql.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn test_card_order_survives_storage() {
        let conn = setup();
        let mut deck = Deck::new("d1", "Ordered");
        deck.white_cards = vec!["w3".into(), "w1".into(), "w2".into()];
        DeckRepo::insert(&conn, &deck).unwrap();

        let loaded = DeckRepo::get(&conn, "d1").unwrap().unwrap();
        assert_eq!(loaded.white_cards, vec!["w3", "w1", "w2"]);
    }

    #[test]
    fn test_corrupt_card_list_is_reported() {
        let conn = setup();
        conn.execute(
            "INSERT INTO decks (id, name, white_cards, black_cards, created_at, updated_at)
             VALUES ('bad', 'Bad', 'not json', '[]', 0, 0)",
            [],
        )
        .unwrap();

        let err = DeckRepo::get(&conn, "bad").unwrap_err();
        assert_eq!(err.code(), "ERR_SERIALIZATION");
        assert_eq!(err.entity_id(), Some("bad"));
    }
}
