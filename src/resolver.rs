//! Cache → database → external API lookup for single cards.
//!
//! [`CardResolver`] is wired from three ports: a [`CacheStore`], a
//! [`CardRepository`] and one [`CardApi`] per game. It owns no state of
//! its own beyond those handles and the cache TTLs, so it is cheap to
//! share behind an `Arc`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tcgsync::cache::MemoryCache;
//! use tcgsync::repository::MemoryCardRepository;
//! use tcgsync::adapters::ScryfallApi;
//! use tcgsync::{CardResolver, Game};
//!
//! let resolver = CardResolver::new(
//!     Arc::new(MemoryCache::new()),
//!     Arc::new(MemoryCardRepository::new()),
//! )
//! .with_adapter(Arc::new(ScryfallApi::new(tcgsync::config::adapter_timeout(Game::Mtg)).unwrap()));
//!
//! let bolt = resolver.resolve("mtg", "M10", "146", true).unwrap();
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::adapters::CardApi;
use crate::cache::CacheStore;
use crate::config;
use crate::error::{Result, TcgSyncError};
use crate::factory::CardFactory;
use crate::models::{Card, CardDto, Game, NaturalKey, SetSummary};
use crate::repository::CardRepository;

/// Where a resolved card came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Cache,
    Database,
    Remote,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Cache => "cache",
            Tier::Database => "database",
            Tier::Remote => "remote",
        })
    }
}

pub struct CardResolver {
    cache: Arc<dyn CacheStore>,
    repository: Arc<dyn CardRepository>,
    adapters: HashMap<Game, Arc<dyn CardApi>>,
    card_ttl: Duration,
    set_list_ttl: Duration,
}

impl CardResolver {
    /// A resolver with no adapters; every repository miss is a miss.
    pub fn new(cache: Arc<dyn CacheStore>, repository: Arc<dyn CardRepository>) -> Self {
        Self {
            cache,
            repository,
            adapters: HashMap::new(),
            card_ttl: config::CARD_TTL,
            set_list_ttl: config::SET_LIST_TTL,
        }
    }

    /// Register the adapter for its game, replacing any earlier one.
    pub fn with_adapter(mut self, adapter: Arc<dyn CardApi>) -> Self {
        self.adapters.insert(adapter.game(), adapter);
        self
    }

    pub fn with_ttls(mut self, card_ttl: Duration, set_list_ttl: Duration) -> Self {
        self.card_ttl = card_ttl;
        self.set_list_ttl = set_list_ttl;
        self
    }

    pub fn adapter(&self, game: Game) -> Option<&Arc<dyn CardApi>> {
        self.adapters.get(&game)
    }

    pub fn repository(&self) -> &Arc<dyn CardRepository> {
        &self.repository
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// Resolve a card by its natural key.
    ///
    /// Returns `Ok(None)` when no tier knows the card. Only an invalid
    /// game tag or a repository failure is an `Err`.
    pub fn resolve(
        &self,
        game: &str,
        set_code: &str,
        number: &str,
        persist_on_miss: bool,
    ) -> Result<Option<Card>> {
        Ok(self
            .resolve_traced(game, set_code, number, persist_on_miss)?
            .map(|(card, _)| card))
    }

    /// Like [`resolve`](Self::resolve), also reporting which tier answered.
    pub fn resolve_traced(
        &self,
        game: &str,
        set_code: &str,
        number: &str,
        persist_on_miss: bool,
    ) -> Result<Option<(Card, Tier)>> {
        let key = NaturalKey::new(Game::parse(game)?, set_code, number);
        let cache_key = key.cache_key();

        if let Some(card) = self.cached_card(&cache_key) {
            tracing::debug!(key = %cache_key, "cache hit");
            return Ok(Some((card, Tier::Cache)));
        }

        if let Some(card) = self
            .repository
            .find_by_set_and_number(key.game, &key.set_code, &key.number)?
        {
            tracing::debug!(key = %cache_key, "database hit");
            self.prime(&cache_key, &card);
            return Ok(Some((card, Tier::Database)));
        }

        let card = match self.fetch_remote(&key) {
            Some(card) => card,
            None => {
                tracing::debug!(key = %cache_key, "not found");
                return Ok(None);
            }
        };
        let card = if persist_on_miss {
            self.persist(card)?
        } else {
            self.prime(&card.natural_key().cache_key(), &card);
            card
        };
        self.prime_alias(&cache_key, &card);
        Ok(Some((card, Tier::Remote)))
    }

    /// Evict the cached entry and refresh the card from its external API.
    ///
    /// The stored row keeps its id and is updated in place. When the API
    /// does not answer, the stored row (if any) is returned instead.
    pub fn force_sync(&self, game: &str, set_code: &str, number: &str) -> Result<Option<Card>> {
        let key = NaturalKey::new(Game::parse(game)?, set_code, number);
        let cache_key = key.cache_key();
        if let Err(e) = self.cache.delete(&cache_key) {
            tracing::warn!(key = %cache_key, error = %e, "cache eviction failed");
        }

        let stored = self
            .repository
            .find_by_set_and_number(key.game, &key.set_code, &key.number)?;

        match (self.fetch_remote(&key), stored) {
            (Some(mut fresh), stored) => {
                let existing = match stored {
                    Some(existing) => Some(existing),
                    None => {
                        let own = fresh.natural_key();
                        self.repository
                            .find_by_set_and_number(own.game, &own.set_code, &own.number)?
                    }
                };
                if let Some(existing) = existing {
                    fresh.id = existing.id;
                }
                let card = self.persist(fresh)?;
                self.prime_alias(&cache_key, &card);
                Ok(Some(card))
            }
            (None, Some(existing)) => {
                tracing::info!(key = %cache_key, "remote miss during force sync; keeping stored card");
                self.prime(&cache_key, &existing);
                Ok(Some(existing))
            }
            (None, None) => Ok(None),
        }
    }

    /// Save a card and prime the cache with what ended up stored.
    ///
    /// If another writer stored the same natural key first, that row wins
    /// and is returned.
    pub fn persist(&self, card: Card) -> Result<Card> {
        let key = card.natural_key();
        let stored = match self.repository.save(&card) {
            Ok(()) => card,
            Err(TcgSyncError::Conflict(reason)) => {
                tracing::debug!(key = %key, %reason, "lost insert race; re-reading");
                self.repository
                    .find_by_set_and_number(key.game, &key.set_code, &key.number)?
                    .ok_or(TcgSyncError::Conflict(reason))?
            }
            Err(e) => return Err(e),
        };
        self.prime(&key.cache_key(), &stored);
        Ok(stored)
    }

    /// Every set the game's API knows about, cached per game.
    pub fn sets(&self, game: Game) -> Result<Vec<SetSummary>> {
        let cache_key = config::set_list_key(game);
        match self.cache.get(&cache_key) {
            Ok(Some(value)) => match serde_json::from_value::<Vec<SetSummary>>(value) {
                Ok(sets) => return Ok(sets),
                Err(e) => self.evict(&cache_key, &e),
            },
            Ok(None) => {}
            Err(e) => self.evict(&cache_key, &e),
        }

        let Some(adapter) = self.adapters.get(&game) else {
            return Ok(Vec::new());
        };
        let sets = match adapter.fetch_all_sets() {
            Ok(sets) => sets,
            Err(e) => {
                tracing::warn!(%game, error = %e, "set listing failed");
                return Ok(Vec::new());
            }
        };
        if !sets.is_empty() {
            let value = serde_json::to_value(&sets)?;
            if let Err(e) = self.cache.set(&cache_key, &value, self.set_list_ttl) {
                tracing::warn!(key = %cache_key, error = %e, "cache write failed");
            }
        }
        Ok(sets)
    }

    /// Free-text search against the game's API. Nothing is stored.
    pub fn search_remote(&self, game: Game, query: &str) -> Result<Vec<CardDto>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let Some(adapter) = self.adapters.get(&game) else {
            return Ok(Vec::new());
        };
        match adapter.search_card(query) {
            Ok(results) => Ok(results),
            Err(e) => {
                tracing::warn!(%game, query, error = %e, "remote search failed");
                Ok(Vec::new())
            }
        }
    }

    // -- internals ---------------------------------------------------------

    fn cached_card(&self, cache_key: &str) -> Option<Card> {
        let value = match self.cache.get(cache_key) {
            Ok(value) => value?,
            Err(e) => {
                self.evict(cache_key, &e);
                return None;
            }
        };
        match CardFactory::from_value(&value) {
            Ok(card) => Some(card),
            Err(e) => {
                self.evict(cache_key, &e);
                None
            }
        }
    }

    fn evict(&self, cache_key: &str, reason: &dyn fmt::Display) {
        tracing::warn!(key = %cache_key, error = %reason, "unreadable cache entry; evicting");
        if let Err(e) = self.cache.delete(cache_key) {
            tracing::warn!(key = %cache_key, error = %e, "cache eviction failed");
        }
    }

    fn prime(&self, cache_key: &str, card: &Card) {
        let value = Value::Object(card.to_fields());
        if let Err(e) = self.cache.set(cache_key, &value, self.card_ttl) {
            tracing::warn!(key = %cache_key, error = %e, "cache write failed");
        }
    }

    /// Also cache `card` under the key it was requested by when the API
    /// answered with a differently spelled key.
    fn prime_alias(&self, cache_key: &str, card: &Card) {
        if card.natural_key().cache_key() != cache_key {
            self.prime(cache_key, card);
        }
    }

    /// Ask the game's adapter and build the card. Transport failures and
    /// malformed records both end up as a miss.
    fn fetch_remote(&self, key: &NaturalKey) -> Option<Card> {
        let adapter = self.adapters.get(&key.game)?;
        let dto = match adapter.get_card_by_set_and_number(&key.set_code, &key.number) {
            Ok(dto) => dto?,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "external lookup failed");
                return None;
            }
        };
        tracing::info!(key = %key, external_id = %dto.id, "fetched from remote");
        match CardFactory::create_for(key.game, &dto.fields) {
            Ok(card) => Some(card),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "remote record rejected");
                None
            }
        }
    }
}
