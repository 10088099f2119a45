//! External card API adapters, one per game.
//!
//! Every adapter maps its API's records into the factory field vocabulary
//! and exposes the same [`CardApi`] contract. Adapters report transport and
//! decoding trouble as [`AdapterError`] and a plain miss as `Ok(None)`; the
//! resolver decides what to do with each.

pub mod optcg;
pub mod pokemontcg;
pub mod scryfall;

pub use optcg::OnePieceApi;
pub use pokemontcg::PokemonTcgApi;
pub use scryfall::ScryfallApi;

use std::collections::VecDeque;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::{Map, Value};

use crate::config;
use crate::models::{CardDto, Game, SetSummary};

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("could not decode response: {0}")]
    Decode(String),
}

pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// An API record already mapped into factory field names.
pub type RawCard = Map<String, Value>;

/// Single-pass stream of raw records; pages are fetched as it is consumed.
pub type CardStream<'a> = Box<dyn Iterator<Item = AdapterResult<RawCard>> + 'a>;

/// Uniform contract over the per-game card APIs.
pub trait CardApi: Send + Sync {
    fn game(&self) -> Game;

    fn search_card(&self, query: &str) -> AdapterResult<Vec<CardDto>>;

    /// `Ok(None)` when the API has no such card.
    fn get_card_by_set_and_number(&self, set_code: &str, number: &str)
        -> AdapterResult<Option<CardDto>>;

    fn fetch_all_sets(&self) -> AdapterResult<Vec<SetSummary>>;

    /// Stream every card of a set. The stream is finite and cannot be
    /// restarted; call again for a fresh pass.
    fn fetch_cards_in_set(&self, set_code: &str) -> AdapterResult<CardStream<'_>>;
}

// ---------------------------------------------------------------------------
// HTTP helper
// ---------------------------------------------------------------------------

/// Blocking HTTP client with one timeout for single lookups and searches
/// and a longer one for set listings and set pages.
pub(crate) struct Http {
    client: Client,
    timeout: Duration,
    listing_timeout: Duration,
}

impl Http {
    pub(crate) fn new(timeout: Duration, headers: HeaderMap) -> crate::Result<Self> {
        let client = Client::builder()
            .user_agent(config::USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            client,
            timeout,
            listing_timeout: config::SET_LISTING_TIMEOUT,
        })
    }

    pub(crate) fn set_listing_timeout(&mut self, timeout: Duration) {
        self.listing_timeout = timeout;
    }

    /// GET a JSON document. A 404 is a miss, not an error.
    pub(crate) fn get_json(&self, url: &str, query: &[(&str, String)]) -> AdapterResult<Option<Value>> {
        self.get_json_with_timeout(url, query, self.timeout)
    }

    /// Like [`get_json`](Self::get_json) with the listing timeout.
    pub(crate) fn get_listing(&self, url: &str, query: &[(&str, String)]) -> AdapterResult<Option<Value>> {
        self.get_json_with_timeout(url, query, self.listing_timeout)
    }

    fn get_json_with_timeout(
        &self,
        url: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> AdapterResult<Option<Value>> {
        tracing::debug!(url, "GET");
        let resp = self.client.get(url).query(query).timeout(timeout).send()?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AdapterError::Status(status.as_u16()));
        }
        Ok(Some(resp.json::<Value>()?))
    }
}

// ---------------------------------------------------------------------------
// Paged stream
// ---------------------------------------------------------------------------

type PageFn<'a> = Box<dyn FnMut() -> AdapterResult<Option<Vec<RawCard>>> + Send + 'a>;

/// Lazily pulls pages from `fetch` until it returns `None` or an empty page.
///
/// A fetch error is yielded once and ends the stream.
pub struct Paged<'a> {
    fetch: PageFn<'a>,
    buffer: VecDeque<RawCard>,
    done: bool,
}

impl<'a> Paged<'a> {
    pub fn new<F>(fetch: F) -> Self
    where
        F: FnMut() -> AdapterResult<Option<Vec<RawCard>>> + Send + 'a,
    {
        Self {
            fetch: Box::new(fetch),
            buffer: VecDeque::new(),
            done: false,
        }
    }
}

impl Iterator for Paged<'_> {
    type Item = AdapterResult<RawCard>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            if self.done {
                return None;
            }
            match (self.fetch)() {
                Ok(Some(page)) if !page.is_empty() => self.buffer.extend(page),
                Ok(_) => self.done = true,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Record mapping helpers
// ---------------------------------------------------------------------------

/// Follow a path of object keys.
pub(crate) fn at<'v>(value: &'v Value, path: &[&str]) -> Option<&'v Value> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .filter(|v| !v.is_null())
}

pub(crate) fn str_at<'v>(value: &'v Value, path: &[&str]) -> Option<&'v str> {
    at(value, path).and_then(Value::as_str)
}

/// Copy a value into the field map when it is present and non-null.
pub(crate) fn put(fields: &mut RawCard, key: &str, value: Option<&Value>) {
    if let Some(v) = value.filter(|v| !v.is_null()) {
        fields.insert(key.to_string(), v.clone());
    }
}

pub(crate) fn put_str(fields: &mut RawCard, key: &str, value: Option<&str>) {
    if let Some(s) = value {
        fields.insert(key.to_string(), Value::String(s.to_string()));
    }
}

/// Parse a numeric value that may arrive as a number or a string.
pub(crate) fn as_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Pull the `data` array out of a list envelope.
pub(crate) fn data_array(doc: &Value) -> AdapterResult<&Vec<Value>> {
    doc.get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| AdapterError::Decode("response has no data array".to_string()))
}

/// Build the uniform DTO from a normalized field map.
pub(crate) fn dto_from_fields(
    game: Game,
    external_id: String,
    fields: RawCard,
    usd_foil: Option<f64>,
    text: Option<String>,
    type_field: Option<String>,
) -> CardDto {
    let get = |k: &str| fields.get(k).and_then(Value::as_str).map(str::to_string);
    let (set_key, number_key) = match game {
        Game::Mtg => ("setCode", "collectorNumber"),
        Game::Pokemon => ("setId", "number"),
        Game::OnePiece => ("setCode", "cardNumber"),
    };

    CardDto {
        id: external_id,
        name: get("name").unwrap_or_default(),
        game,
        set: get(set_key).unwrap_or_default(),
        set_name: get("setName").unwrap_or_default(),
        number: get(number_key).unwrap_or_default(),
        rarity: get("rarity").unwrap_or_default(),
        image_url: get("imageUrl"),
        artist: get("artist"),
        is_foil: fields.get("isFoil").and_then(Value::as_bool).unwrap_or(false),
        prices: crate::models::DtoPrices {
            usd: as_f64(fields.get("prices").and_then(|p| p.get("usd"))),
            usd_foil,
        },
        type_field,
        text,
        fields,
    }
}
