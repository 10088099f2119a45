use std::sync::{Mutex, MutexGuard};

use super::{clamp_search_limit, CardRepository};
use crate::error::{Result, TcgSyncError};
use crate::models::{Card, Game, NaturalKey};

/// In-process card store with the same key semantics as the DuckDB store.
#[derive(Default)]
pub struct MemoryCardRepository {
    cards: Mutex<Vec<Card>>,
}

impl MemoryCardRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Card>> {
        self.cards.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Compares normalized keys, the way the DuckDB store's key columns do.
fn same_key(card: &Card, key: &NaturalKey) -> bool {
    let own = card.natural_key();
    own.game == key.game
        && own.set_code.eq_ignore_ascii_case(&key.set_code)
        && own.number.eq_ignore_ascii_case(&key.number)
}

fn by_game_then_name(a: &Card, b: &Card) -> std::cmp::Ordering {
    a.game()
        .as_str()
        .cmp(b.game().as_str())
        .then_with(|| a.name.cmp(&b.name))
}

impl CardRepository for MemoryCardRepository {
    fn find_by_set_and_number(
        &self,
        game: Game,
        set_code: &str,
        number: &str,
    ) -> Result<Option<Card>> {
        let key = NaturalKey::new(game, set_code, number);
        Ok(self.lock().iter().find(|c| same_key(c, &key)).cloned())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Card>> {
        Ok(self.lock().iter().find(|c| c.id == id).cloned())
    }

    fn find_by_game(
        &self,
        game: Game,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<Card>> {
        let mut cards: Vec<Card> = self
            .lock()
            .iter()
            .filter(|c| c.game() == game)
            .cloned()
            .collect();
        cards.sort_by(by_game_then_name);
        Ok(cards
            .into_iter()
            .skip(offset.unwrap_or(0))
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }

    fn search_by_name(&self, query: &str, game: Option<Game>, limit: usize) -> Result<Vec<Card>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut cards: Vec<Card> = self
            .lock()
            .iter()
            .filter(|c| game.map_or(true, |g| c.game() == g))
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        cards.sort_by(by_game_then_name);
        cards.truncate(clamp_search_limit(limit));
        Ok(cards)
    }

    fn count_by_game(&self, game: Game) -> Result<u64> {
        Ok(self.lock().iter().filter(|c| c.game() == game).count() as u64)
    }

    fn save(&self, card: &Card) -> Result<()> {
        let key = card.natural_key();
        let mut cards = self.lock();

        if let Some(other) = cards.iter().find(|c| c.id != card.id && same_key(c, &key)) {
            return Err(TcgSyncError::Conflict(format!(
                "{} is already stored as card {}",
                key, other.id
            )));
        }

        match cards.iter_mut().find(|c| c.id == card.id) {
            Some(existing) => *existing = card.clone(),
            None => cards.push(card.clone()),
        }
        Ok(())
    }
}
