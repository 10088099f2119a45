//! Card store backed by the embedded DuckDB database.

use std::collections::HashMap;

use serde_json::Value;

use super::{clamp_search_limit, CardRepository};
use crate::connection::{map_constraint_error, Connection};
use crate::error::{Result, TcgSyncError};
use crate::factory::CardFactory;
use crate::models::{Card, Game, NaturalKey};
use crate::sql_builder::SqlBuilder;

/// Single-table card store with a `game` discriminator column.
///
/// Each row carries the card's full field map in `fields`; rows are turned
/// back into cards through [`CardFactory`].
pub struct DuckDbCardRepository {
    conn: Connection,
}

impl DuckDbCardRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    /// Access the underlying connection for ad-hoc queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn query_cards(&self, qb: &SqlBuilder) -> Result<Vec<Card>> {
        let (sql, params) = qb.build();
        let rows = self.conn.execute(&sql, &params)?;
        rows.into_iter().map(row_to_card).collect()
    }
}

/// Rebuild a card from the `fields` column.
fn row_to_card(row: HashMap<String, Value>) -> Result<Card> {
    let fields = match row.get("fields") {
        Some(Value::String(raw)) => serde_json::from_str::<Value>(raw)?,
        _ => Value::Null,
    };
    CardFactory::from_value(&fields)
}

impl CardRepository for DuckDbCardRepository {
    fn find_by_set_and_number(
        &self,
        game: Game,
        set_code: &str,
        number: &str,
    ) -> Result<Option<Card>> {
        let key = NaturalKey::new(game, set_code, number);
        let mut qb = SqlBuilder::new("cards");
        qb.select(&["fields"])
            .where_eq("game", game.as_str())
            .where_eq("set_key", &key.set_code.to_lowercase())
            .where_eq("number_key", &key.number.to_lowercase())
            .limit(1);
        Ok(self.query_cards(&qb)?.into_iter().next())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Card>> {
        let mut qb = SqlBuilder::new("cards");
        qb.select(&["fields"]).where_eq("id", id).limit(1);
        Ok(self.query_cards(&qb)?.into_iter().next())
    }

    fn find_by_game(
        &self,
        game: Game,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<Card>> {
        let mut qb = SqlBuilder::new("cards");
        qb.select(&["fields"])
            .where_eq("game", game.as_str())
            .order_by(&["name ASC", "id ASC"]);
        if let Some(n) = limit {
            qb.limit(n);
        }
        if let Some(n) = offset {
            qb.offset(n);
        }
        self.query_cards(&qb)
    }

    fn search_by_name(&self, query: &str, game: Option<Game>, limit: usize) -> Result<Vec<Card>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = SqlBuilder::new("cards");
        qb.select(&["fields"]).where_contains("name", query);
        if let Some(game) = game {
            qb.where_eq("game", game.as_str());
        }
        qb.order_by(&["game ASC", "name ASC"])
            .limit(clamp_search_limit(limit));
        self.query_cards(&qb)
    }

    fn count_by_game(&self, game: Game) -> Result<u64> {
        let (sql, params) = SqlBuilder::new("cards")
            .select(&["COUNT(*) AS cnt"])
            .where_eq("game", game.as_str())
            .build();
        let cnt = self
            .conn
            .execute_scalar(&sql, &params)?
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        Ok(cnt)
    }

    fn save(&self, card: &Card) -> Result<()> {
        let key = card.natural_key();
        let game = key.game.as_str().to_string();
        let set_key = key.set_code.to_lowercase();
        let number_key = key.number.to_lowercase();
        let fields = serde_json::to_string(&card.to_fields())?;

        // Same id and same natural key: update the mutable columns in place.
        let updated = self.conn.transaction(|tx| {
            tx.execute(
                "UPDATE cards SET name = ?, image_url = ?, fields = ?, updated_at = current_timestamp \
                 WHERE id = ? AND game = ? AND set_key = ? AND number_key = ?",
                duckdb::params![
                    card.name,
                    card.image_url,
                    fields,
                    card.id,
                    game,
                    set_key,
                    number_key
                ],
            )
            .map_err(map_constraint_error)
        })?;
        if updated > 0 {
            return Ok(());
        }

        let mut holder = SqlBuilder::new("cards");
        holder
            .select(&["id"])
            .where_eq("game", &game)
            .where_eq("set_key", &set_key)
            .where_eq("number_key", &number_key);
        let (sql, params) = holder.build();
        if let Some(Value::String(other)) = self.conn.execute_scalar(&sql, &params)? {
            if other != card.id {
                return Err(TcgSyncError::Conflict(format!(
                    "{} is already stored as card {}",
                    key, other
                )));
            }
        }

        // New card, or the id moved to another natural key. DuckDB checks
        // uniqueness eagerly, so the old row goes in its own statement.
        self.conn.transaction(|tx| {
            tx.execute("DELETE FROM cards WHERE id = ?", duckdb::params![card.id])
                .map_err(map_constraint_error)
        })?;
        self.conn.transaction(|tx| {
            tx.execute(
                "INSERT INTO cards (id, game, set_code, number, set_key, number_key, name, image_url, fields) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                duckdb::params![
                    card.id,
                    game,
                    key.set_code,
                    key.number,
                    set_key,
                    number_key,
                    card.name,
                    card.image_url,
                    fields
                ],
            )
            .map_err(map_constraint_error)?;
            Ok(())
        })
    }
}
