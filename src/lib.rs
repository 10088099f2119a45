//! Card resolution and sync engine for Magic: The Gathering, Pokémon and
//! One Piece card data.
//!
//! Cards are looked up by their natural key (game, set code, number)
//! through a cache, then a local DuckDB card store, then the game's public
//! card API. Whatever the API returns is stored and cached so the next
//! lookup stays local.
//!
//! # Quick start
//!
//! ```no_run
//! use tcgsync::{CardRepository, TcgSync};
//!
//! let client = TcgSync::builder().build().unwrap();
//!
//! // Resolve one card, fetching and storing it on first use
//! let card = client.resolver().resolve("pokemon", "base1", "4", true).unwrap();
//!
//! // Search what has been stored so far
//! let hits = client.cards().search_by_name("charizard", None, 20).unwrap();
//! ```

pub mod adapters;
#[cfg(feature = "async")]
pub mod async_client;
pub mod cache;
pub mod config;
pub mod connection;
pub mod error;
pub mod factory;
pub mod models;
pub mod repository;
pub mod resolver;
pub mod sql_builder;
pub mod sync;
pub mod validator;

#[cfg(feature = "async")]
pub use async_client::AsyncTcgSync;
pub use cache::{CacheStore, FileCache, MemoryCache};
pub use connection::Connection;
pub use error::{Result, TcgSyncError};
pub use factory::CardFactory;
pub use models::{Card, CardPayload, Deck, Game, NaturalKey, Zone};
pub use repository::CardRepository;
pub use resolver::{CardResolver, Tier};
pub use sql_builder::SqlBuilder;
pub use sync::{BulkSync, ImageStore, SyncOptions, SyncReport};
pub use validator::DeckValidator;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use adapters::{CardApi, OnePieceApi, PokemonTcgApi, ScryfallApi};
use repository::DuckDbCardRepository;

// ---------------------------------------------------------------------------
// TcgSyncBuilder
// ---------------------------------------------------------------------------

/// Where the card store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Database {
    InMemory,
    File(PathBuf),
}

/// Builder for configuring and constructing a [`TcgSync`] instance.
///
/// Use [`TcgSync::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](TcgSyncBuilder::build).
#[derive(Default)]
pub struct TcgSyncBuilder {
    cache_dir: Option<PathBuf>,
    database: Option<Database>,
    offline: bool,
    timeout: Option<Duration>,
    pokemon_api_key: Option<String>,
    memory_cache: bool,
}

impl TcgSyncBuilder {
    /// Set a custom cache directory.
    ///
    /// If not set, the platform-appropriate default cache directory is used
    /// (e.g. `~/.cache/tcgsync` on Linux).
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Store cards in a DuckDB file. Defaults to
    /// [`config::default_db_path()`].
    pub fn database<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.database = Some(Database::File(path.as_ref().to_path_buf()));
        self
    }

    /// Keep the card store in memory; nothing survives the process.
    pub fn in_memory(mut self) -> Self {
        self.database = Some(Database::InMemory);
        self
    }

    /// When offline no card APIs are registered, so lookups stop at the
    /// card store. Defaults to `false`.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Override every adapter's request timeout, set listings included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Key sent as `X-Api-Key` to the Pokémon TCG API.
    pub fn pokemon_api_key(mut self, key: impl Into<String>) -> Self {
        self.pokemon_api_key = Some(key.into());
        self
    }

    /// Use an in-process cache instead of the on-disk one.
    pub fn memory_cache(mut self, memory: bool) -> Self {
        self.memory_cache = memory;
        self
    }

    pub fn build(self) -> Result<TcgSync> {
        let cache: Arc<dyn CacheStore> = if self.memory_cache {
            Arc::new(MemoryCache::new())
        } else {
            Arc::new(FileCache::new(self.cache_dir.clone())?)
        };

        let database = self
            .database
            .unwrap_or_else(|| Database::File(config::default_db_path()));
        let conn = match &database {
            Database::InMemory => Connection::open_in_memory()?,
            Database::File(path) => Connection::open(path)?,
        };
        let cards = Arc::new(DuckDbCardRepository::new(conn));

        let mut resolver = CardResolver::new(cache, cards.clone());
        if !self.offline {
            let timeout = |game| self.timeout.unwrap_or_else(|| config::adapter_timeout(game));
            let listing = self.timeout.unwrap_or(config::SET_LISTING_TIMEOUT);
            let adapters: [Arc<dyn CardApi>; 3] = [
                Arc::new(ScryfallApi::new(timeout(Game::Mtg))?.with_listing_timeout(listing)),
                Arc::new(
                    PokemonTcgApi::new(timeout(Game::Pokemon), self.pokemon_api_key.as_deref())?
                        .with_listing_timeout(listing),
                ),
                Arc::new(OnePieceApi::new(timeout(Game::OnePiece))?.with_listing_timeout(listing)),
            ];
            for adapter in adapters {
                resolver = resolver.with_adapter(adapter);
            }
        }

        tracing::debug!(?database, offline = self.offline, "tcgsync ready");
        Ok(TcgSync {
            resolver,
            cards,
            database,
            offline: self.offline,
        })
    }
}

// ---------------------------------------------------------------------------
// TcgSync
// ---------------------------------------------------------------------------

/// The main entry point: a resolver wired to the file cache, the DuckDB
/// card store and the three card APIs.
///
/// Created via [`TcgSync::builder()`].
pub struct TcgSync {
    resolver: CardResolver,
    cards: Arc<DuckDbCardRepository>,
    database: Database,
    offline: bool,
}

impl TcgSync {
    /// Create a new builder for configuring the client.
    pub fn builder() -> TcgSyncBuilder {
        TcgSyncBuilder::default()
    }

    pub fn resolver(&self) -> &CardResolver {
        &self.resolver
    }

    /// Direct access to the card store.
    pub fn cards(&self) -> &DuckDbCardRepository {
        &self.cards
    }

    /// A bulk import job over this client's resolver.
    pub fn bulk_sync(&self) -> BulkSync<'_> {
        BulkSync::new(&self.resolver)
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }
}

impl fmt::Display for TcgSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let db = match &self.database {
            Database::InMemory => ":memory:".to_string(),
            Database::File(path) => path.display().to_string(),
        };
        write!(f, "TcgSync(database={}, offline={})", db, self.offline)
    }
}
