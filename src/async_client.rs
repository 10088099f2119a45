//! Async wrapper around [`TcgSync`] for use in async runtimes (Tokio, etc.).
//!
//! Runs every operation on the blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free while
//! the resolver waits on HTTP or DuckDB.
//!
//! # Example
//!
//! ```no_run
//! use tcgsync::AsyncTcgSync;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let client = AsyncTcgSync::builder().build().await.unwrap();
//!
//!     let card = client.resolve("mtg", "M10", "146").await.unwrap();
//!
//!     // Anything else on the sync client via closure
//!     let stored = client.run(|c| {
//!         use tcgsync::CardRepository;
//!         c.cards().count_by_game(tcgsync::Game::Mtg)
//!     }).await.unwrap();
//! }
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, TcgSyncError};
use crate::models::{Card, CardDto, Game, SetSummary};
use crate::sync::{SyncOptions, SyncReport};
use crate::{TcgSync, TcgSyncBuilder};

// ---------------------------------------------------------------------------
// AsyncTcgSyncBuilder
// ---------------------------------------------------------------------------

/// Builder for an [`AsyncTcgSync`]; the options mirror [`TcgSyncBuilder`].
#[derive(Default)]
pub struct AsyncTcgSyncBuilder {
    inner: TcgSyncBuilder,
}

impl AsyncTcgSyncBuilder {
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.inner = self.inner.cache_dir(path);
        self
    }

    pub fn database<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.inner = self.inner.database(path);
        self
    }

    pub fn in_memory(mut self) -> Self {
        self.inner = self.inner.in_memory();
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.inner = self.inner.offline(offline);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.timeout(timeout);
        self
    }

    pub fn pokemon_api_key(mut self, key: impl Into<String>) -> Self {
        self.inner = self.inner.pokemon_api_key(key);
        self
    }

    pub fn memory_cache(mut self, memory: bool) -> Self {
        self.inner = self.inner.memory_cache(memory);
        self
    }

    /// Build the client. Opening the database runs on the blocking pool.
    pub async fn build(self) -> Result<AsyncTcgSync> {
        let builder = self.inner;
        tokio::task::spawn_blocking(move || {
            Ok(AsyncTcgSync {
                inner: Arc::new(builder.build()?),
            })
        })
        .await
        .map_err(join_error)?
    }
}

fn join_error(e: tokio::task::JoinError) -> TcgSyncError {
    TcgSyncError::InvalidArgument(format!("Task join error: {e}"))
}

// ---------------------------------------------------------------------------
// AsyncTcgSync
// ---------------------------------------------------------------------------

/// Async wrapper around [`TcgSync`].
///
/// The sync client is `Sync`, so concurrent calls share one instance
/// without an outer lock. Cloning is cheap.
#[derive(Clone)]
pub struct AsyncTcgSync {
    inner: Arc<TcgSync>,
}

impl AsyncTcgSync {
    pub fn builder() -> AsyncTcgSyncBuilder {
        AsyncTcgSyncBuilder::default()
    }

    /// Wrap an already-built client.
    pub fn from_client(client: TcgSync) -> Self {
        Self {
            inner: Arc::new(client),
        }
    }

    /// Run a sync client operation on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&TcgSync) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let client = self.inner.clone();
        tokio::task::spawn_blocking(move || f(&client))
            .await
            .map_err(join_error)?
    }

    /// Resolve a card, storing it on a remote hit.
    pub async fn resolve(&self, game: &str, set_code: &str, number: &str) -> Result<Option<Card>> {
        let (game, set_code, number) = (game.to_string(), set_code.to_string(), number.to_string());
        self.run(move |c| c.resolver().resolve(&game, &set_code, &number, true))
            .await
    }

    pub async fn force_sync(
        &self,
        game: &str,
        set_code: &str,
        number: &str,
    ) -> Result<Option<Card>> {
        let (game, set_code, number) = (game.to_string(), set_code.to_string(), number.to_string());
        self.run(move |c| c.resolver().force_sync(&game, &set_code, &number))
            .await
    }

    pub async fn search_remote(&self, game: Game, query: &str) -> Result<Vec<CardDto>> {
        let query = query.to_string();
        self.run(move |c| c.resolver().search_remote(game, &query))
            .await
    }

    pub async fn sets(&self, game: Game) -> Result<Vec<SetSummary>> {
        self.run(move |c| c.resolver().sets(game)).await
    }

    /// Run a bulk import without images.
    pub async fn sync(
        &self,
        game: Game,
        set: Option<&str>,
        options: SyncOptions,
    ) -> Result<SyncReport> {
        let set = set.map(str::to_string);
        self.run(move |c| c.bulk_sync().run(game, set.as_deref(), options))
            .await
    }
}
