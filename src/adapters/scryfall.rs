//! Magic: The Gathering cards via the Scryfall API.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::{Map, Value};

use super::{
    at, data_array, dto_from_fields, put, put_str, str_at, AdapterResult, CardApi, CardStream,
    Http, Paged, RawCard,
};
use crate::config;
use crate::models::{CardDto, Game, SetSummary};

pub struct ScryfallApi {
    http: Http,
    base_url: String,
}

impl ScryfallApi {
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        Self::with_base_url(config::SCRYFALL_BASE, timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
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
        dto_from_fields(
            Game::Mtg,
            external_id,
            fields,
            super::as_f64(at(card, &["prices", "usd_foil"])),
            oracle_text(card),
            str_at(card, &["type_line"]).map(str::to_string),
        )
    }
}

/// First face's value for double-faced cards that lack a top-level one.
fn face_or_top<'v>(card: &'v Value, key: &str) -> Option<&'v Value> {
    at(card, &[key]).or_else(|| {
        card.get("card_faces")
            .and_then(Value::as_array)
            .and_then(|faces| faces.first())
            .and_then(|face| at(face, &[key]))
    })
}

fn oracle_text(card: &Value) -> Option<String> {
    if let Some(text) = str_at(card, &["oracle_text"]) {
        return Some(text.to_string());
    }
    let faces = card.get("card_faces")?.as_array()?;
    let texts: Vec<&str> = faces
        .iter()
        .filter_map(|f| str_at(f, &["oracle_text"]))
        .collect();
    (!texts.is_empty()).then(|| texts.join("\n//\n"))
}

/// Map a Scryfall card object into factory fields.
pub fn normalize(card: &Value) -> RawCard {
    let mut f = Map::new();
    put(&mut f, "name", at(card, &["name"]));
    put(&mut f, "setCode", at(card, &["set"]));
    put(&mut f, "setName", at(card, &["set_name"]));
    put(&mut f, "collectorNumber", at(card, &["collector_number"]));
    put(&mut f, "rarity", at(card, &["rarity"]));
    put(&mut f, "manaCost", face_or_top(card, "mana_cost"));
    put(&mut f, "typeLine", at(card, &["type_line"]));
    put_str(&mut f, "oracleText", oracle_text(card).as_deref());
    put(&mut f, "power", face_or_top(card, "power"));
    put(&mut f, "toughness", face_or_top(card, "toughness"));
    put(&mut f, "loyalty", face_or_top(card, "loyalty"));
    put(&mut f, "colors", face_or_top(card, "colors"));
    put(&mut f, "colorIdentity", at(card, &["color_identity"]));
    put(&mut f, "artist", at(card, &["artist"]));

    // Foil-only printings.
    let foil = at(card, &["foil"]).and_then(Value::as_bool).unwrap_or(false);
    let nonfoil = at(card, &["nonfoil"]).and_then(Value::as_bool).unwrap_or(true);
    f.insert("isFoil".into(), Value::Bool(foil && !nonfoil));

    let image = face_or_top(card, "image_uris").and_then(|uris| {
        at(uris, &["normal"]).or_else(|| at(uris, &["large"]))
    });
    put(&mut f, "imageUrl", image);

    let mut prices = Map::new();
    put(&mut prices, "usd", at(card, &["prices", "usd"]));
    put(&mut prices, "eur", at(card, &["prices", "eur"]));
    put(&mut prices, "tix", at(card, &["prices", "tix"]));
    f.insert("prices".into(), Value::Object(prices));
    f
}

impl CardApi for ScryfallApi {
    fn game(&self) -> Game {
        Game::Mtg
    }

    fn search_card(&self, query: &str) -> AdapterResult<Vec<CardDto>> {
        let url = format!("{}/cards/search", self.base_url);
        match self.http.get_json(&url, &[("q", query.to_string())])? {
            Some(doc) => Ok(data_array(&doc)?.iter().map(Self::to_dto).collect()),
            None => Ok(Vec::new()),
        }
    }

    fn get_card_by_set_and_number(
        &self,
        set_code: &str,
        number: &str,
    ) -> AdapterResult<Option<CardDto>> {
        let url = format!(
            "{}/cards/{}/{}",
            self.base_url,
            set_code.to_lowercase(),
            number
        );
        Ok(self.http.get_json(&url, &[])?.map(|card| Self::to_dto(&card)))
    }

    fn fetch_all_sets(&self) -> AdapterResult<Vec<SetSummary>> {
        let url = format!("{}/sets", self.base_url);
        let doc = match self.http.get_listing(&url, &[])? {
            Some(doc) => doc,
            None => return Ok(Vec::new()),
        };
        Ok(data_array(&doc)?
            .iter()
            .filter_map(|s| {
                Some(SetSummary {
                    code: str_at(s, &["code"])?.to_string(),
                    name: str_at(s, &["name"])?.to_string(),
                })
            })
            .collect())
    }

    fn fetch_cards_in_set(&self, set_code: &str) -> AdapterResult<CardStream<'_>> {
        let first = format!(
            "{}/cards/search?q=e%3A{}&unique=prints&order=set&include_extras=true",
            self.base_url,
            set_code.to_lowercase()
        );
        let mut next_url = Some(first);

        let stream = Paged::new(move || {
            let url = match next_url.take() {
                Some(url) => url,
                None => return Ok(None),
            };
            let doc = match self.http.get_listing(&url, &[])? {
                Some(doc) => doc,
                None => return Ok(None),
            };
            if at(&doc, &["has_more"]).and_then(Value::as_bool).unwrap_or(false) {
                next_url = str_at(&doc, &["next_page"]).map(str::to_string);
            }
            Ok(Some(data_array(&doc)?.iter().map(normalize).collect()))
        });
        Ok(Box::new(stream))
    }
}
