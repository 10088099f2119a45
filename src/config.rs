use std::path::PathBuf;
use std::time::Duration;

use crate::models::Game;

pub const SCRYFALL_BASE: &str = "https://api.scryfall.com";
pub const POKEMONTCG_BASE: &str = "https://api.pokemontcg.io/v2";
pub const OPTCG_BASE: &str = "https://optcgapi.com/api";

pub const USER_AGENT: &str = concat!("tcgsync/", env!("CARGO_PKG_VERSION"));

/// Per-card cache entries live for a day.
pub const CARD_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const SET_LIST_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Hard cap on `search_by_name` results.
pub const SEARCH_LIMIT_MAX: usize = 50;

pub const POKEMONTCG_PAGE_SIZE: usize = 250;

pub const BASIC_LANDS: [&str; 5] = ["Plains", "Island", "Swamp", "Mountain", "Forest"];

/// Default single-card request timeout for each game's API.
pub fn adapter_timeout(game: Game) -> Duration {
    match game {
        Game::Mtg => Duration::from_secs(10),
        Game::Pokemon => Duration::from_secs(10),
        Game::OnePiece => Duration::from_secs(5),
    }
}

/// Set listings and set pages are larger responses and get more headroom.
pub const SET_LISTING_TIMEOUT: Duration = Duration::from_secs(15);

/// Cache key for a game's set list.
pub fn set_list_key(game: Game) -> String {
    format!("sets:{}", game.as_str())
}

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("tcgsync")
    } else {
        PathBuf::from(".tcgsync-cache")
    }
}

pub fn default_db_path() -> PathBuf {
    if let Some(data) = dirs::data_local_dir() {
        data.join("tcgsync").join("cards.duckdb")
    } else {
        PathBuf::from("tcgsync.duckdb")
    }
}
