//! Pokémon cards via the Pokémon TCG API (v2).

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Map, Value};

use super::{
    as_f64, at, data_array, dto_from_fields, put, str_at, AdapterResult, CardApi,
    CardStream, Http, Paged, RawCard,
};
use crate::config;
use crate::error::TcgSyncError;
use crate::models::{CardDto, Game, SetSummary};

/// TCGplayer price buckets, most common first.
const PRICE_BUCKETS: [&str; 5] = [
    "normal",
    "holofoil",
    "reverseHolofoil",
    "1stEditionHolofoil",
    "1stEditionNormal",
];

pub struct PokemonTcgApi {
    http: Http,
    base_url: String,
}

impl PokemonTcgApi {
    pub fn new(timeout: Duration, api_key: Option<&str>) -> crate::Result<Self> {
        Self::with_base_url(config::POKEMONTCG_BASE, timeout, api_key)
    }

    pub fn with_base_url(
        base_url: &str,
        timeout: Duration,
        api_key: Option<&str>,
    ) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| TcgSyncError::InvalidArgument(format!("invalid API key: {}", e)))?;
            headers.insert("X-Api-Key", value);
        }
        Ok(Self {
            http: Http::new(timeout, headers)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Timeout for set listings and set pages.
    pub fn with_listing_timeout(mut self, timeout: Duration) -> Self {
        self.http.set_listing_timeout(timeout);
        self
    }

    fn to_dto(card: &Value) -> CardDto {
        let fields = normalize(card);
        let external_id = str_at(card, &["id"]).unwrap_or_default().to_string();
        let usd_foil = as_f64(at(card, &["tcgplayer", "prices", "holofoil", "market"]));
        let text = card
            .get("rules")
            .and_then(Value::as_array)
            .map(|rules| {
                rules
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .filter(|t| !t.is_empty());
        let type_field = str_at(card, &["supertype"]).map(str::to_string);
        dto_from_fields(Game::Pokemon, external_id, fields, usd_foil, text, type_field)
    }

    fn card_query(q: String, page: usize, page_size: usize) -> [(&'static str, String); 3] {
        [
            ("q", q),
            ("page", page.to_string()),
            ("pageSize", page_size.to_string()),
        ]
    }
}

/// Map a Pokémon TCG API card object into factory fields.
pub fn normalize(card: &Value) -> RawCard {
    let mut f = Map::new();
    put(&mut f, "name", at(card, &["name"]));
    put(&mut f, "setId", at(card, &["set", "id"]));
    put(&mut f, "setName", at(card, &["set", "name"]));
    put(&mut f, "number", at(card, &["number"]));
    put(&mut f, "rarity", at(card, &["rarity"]));
    put(&mut f, "supertype", at(card, &["supertype"]));
    put(&mut f, "subtypes", at(card, &["subtypes"]));
    put(&mut f, "hp", at(card, &["hp"]));
    put(&mut f, "types", at(card, &["types"]));
    put(&mut f, "evolvesFrom", at(card, &["evolvesFrom"]));
    put(&mut f, "attacks", at(card, &["attacks"]));
    put(&mut f, "weaknesses", at(card, &["weaknesses"]));
    put(&mut f, "resistances", at(card, &["resistances"]));
    put(&mut f, "retreatCost", at(card, &["convertedRetreatCost"]));
    put(&mut f, "artist", at(card, &["artist"]));
    put(
        &mut f,
        "nationalPokedexNumber",
        card.get("nationalPokedexNumbers")
            .and_then(Value::as_array)
            .and_then(|n| n.first()),
    );
    put(
        &mut f,
        "imageUrl",
        at(card, &["images", "large"]).or_else(|| at(card, &["images", "small"])),
    );

    let usd = PRICE_BUCKETS
        .iter()
        .find_map(|bucket| at(card, &["tcgplayer", "prices", *bucket, "market"]));
    let eur = at(card, &["cardmarket", "prices", "averageSellPrice"])
        .or_else(|| at(card, &["cardmarket", "prices", "trendPrice"]));
    let mut prices = Map::new();
    put(&mut prices, "usd", usd);
    put(&mut prices, "eur", eur);
    f.insert("prices".into(), Value::Object(prices));
    f
}

/// Quote a value for the API's Lucene-style `q` syntax.
fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', ""))
}

impl CardApi for PokemonTcgApi {
    fn game(&self) -> Game {
        Game::Pokemon
    }

    fn search_card(&self, query: &str) -> AdapterResult<Vec<CardDto>> {
        let q = format!("name:{}", quoted(&format!("{}*", query.trim())));
        let url = format!("{}/cards", self.base_url);
        match self.http.get_json(&url, &Self::card_query(q, 1, config::SEARCH_LIMIT_MAX))? {
            Some(doc) => Ok(data_array(&doc)?.iter().map(Self::to_dto).collect()),
            None => Ok(Vec::new()),
        }
    }

    fn get_card_by_set_and_number(
        &self,
        set_code: &str,
        number: &str,
    ) -> AdapterResult<Option<CardDto>> {
        let q = format!("set.id:{} number:{}", quoted(set_code), quoted(number));
        let url = format!("{}/cards", self.base_url);
        let doc = match self.http.get_json(&url, &[("q", q)])? {
            Some(doc) => doc,
            None => return Ok(None),
        };
        Ok(data_array(&doc)?.first().map(Self::to_dto))
    }

    fn fetch_all_sets(&self) -> AdapterResult<Vec<SetSummary>> {
        let url = format!("{}/sets", self.base_url);
        let doc = match self
            .http
            .get_listing(&url, &[("pageSize", config::POKEMONTCG_PAGE_SIZE.to_string())])?
        {
            Some(doc) => doc,
            None => return Ok(Vec::new()),
        };
        Ok(data_array(&doc)?
            .iter()
            .filter_map(|s| {
                Some(SetSummary {
                    code: str_at(s, &["id"])?.to_string(),
                    name: str_at(s, &["name"])?.to_string(),
                })
            })
            .collect())
    }

    fn fetch_cards_in_set(&self, set_code: &str) -> AdapterResult<CardStream<'_>> {
        let q = format!("set.id:{}", quoted(set_code));
        let url = format!("{}/cards", self.base_url);
        let page_size = config::POKEMONTCG_PAGE_SIZE;
        let mut page = 0usize;
        let mut remaining: Option<u64> = None;

        let stream = Paged::new(move || {
            if remaining == Some(0) {
                return Ok(None);
            }
            page += 1;
            let doc = match self
                .http
                .get_listing(&url, &Self::card_query(q.clone(), page, page_size))?
            {
                Some(doc) => doc,
                None => return Ok(None),
            };
            let data = data_array(&doc)?;
            let total = at(&doc, &["totalCount"]).and_then(Value::as_u64).unwrap_or(0);
            let seen = ((page - 1) * page_size + data.len()) as u64;
            remaining = Some(total.saturating_sub(seen));
            Ok(Some(data.iter().map(normalize).collect()))
        });
        Ok(Box::new(stream))
    }
}
