//! Card persistence boundary.
//!
//! The resolver and the bulk sync job only see the [`CardRepository`]
//! port. [`DuckDbCardRepository`] is the durable store;
//! [`MemoryCardRepository`] keeps everything in process.

pub mod duckdb_store;
pub mod memory;

pub use self::duckdb_store::DuckDbCardRepository;
pub use self::memory::MemoryCardRepository;

use crate::config::SEARCH_LIMIT_MAX;
use crate::error::Result;
use crate::models::{Card, Game};

pub trait CardRepository: Send + Sync {
    /// Look a card up by its natural key. Set code and number compare
    /// case-insensitively.
    fn find_by_set_and_number(&self, game: Game, set_code: &str, number: &str)
        -> Result<Option<Card>>;

    fn find_by_id(&self, id: &str) -> Result<Option<Card>>;

    /// Cards of one game ordered by name.
    fn find_by_game(&self, game: Game, limit: Option<usize>, offset: Option<usize>)
        -> Result<Vec<Card>>;

    /// Case-insensitive substring match on the card name, ordered by
    /// (game, name). A blank query matches nothing.
    fn search_by_name(&self, query: &str, game: Option<Game>, limit: usize) -> Result<Vec<Card>>;

    fn count_by_game(&self, game: Game) -> Result<u64>;

    /// Insert or update by id.
    ///
    /// Fails with [`TcgSyncError::Conflict`](crate::TcgSyncError::Conflict)
    /// when a different id already holds the same natural key.
    fn save(&self, card: &Card) -> Result<()>;

    fn exists(&self, game: Game, set_code: &str, number: &str) -> Result<bool> {
        Ok(self.find_by_set_and_number(game, set_code, number)?.is_some())
    }
}

/// Clamp a requested search size into `1..=SEARCH_LIMIT_MAX`.
pub fn clamp_search_limit(limit: usize) -> usize {
    limit.clamp(1, SEARCH_LIMIT_MAX)
}
