//! One Piece cards via the OPTCG API.
//!
//! OPTCG identifies cards by their printed id (`OP01-001`) and sets by a
//! dashed id (`OP-01`). Cards are stored with the undashed set prefix as
//! their set code and the part after the dash as their number.

use std::time::Duration;

use reqwest::header::HeaderMap;
use serde_json::{Map, Value};

use super::{
    at, dto_from_fields, put, put_str, str_at, AdapterError, AdapterResult, CardApi, CardStream,
    Http, Paged, RawCard,
};
use crate::config;
use crate::models::{CardDto, Game, SetSummary};

const TRIGGER_MARKER: &str = "[Trigger]";

pub struct OnePieceApi {
    http: Http,
    base_url: String,
}

impl OnePieceApi {
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        Self::with_base_url(config::OPTCG_BASE, timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> crate::Result<Self> {
        Ok(Self {
            http: Http::new(timeout, HeaderMap::new())?,
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
        let external_id = str_at(card, &["card_set_id"]).unwrap_or_default().to_string();
        let text = str_at(card, &["card_text"]).map(str::to_string);
        let type_field = str_at(card, &["card_type"]).map(str::to_string);
        dto_from_fields(Game::OnePiece, external_id, fields, None, text, type_field)
    }

    /// The API returns bare arrays; anything else is a decoding problem.
    fn cards_at(&self, url: &str, listing: bool) -> AdapterResult<Option<Vec<Value>>> {
        let doc = if listing {
            self.http.get_listing(url, &[])?
        } else {
            self.http.get_json(url, &[])?
        };
        match doc {
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(Value::Object(obj)) if obj.contains_key("error") => Ok(None),
            Some(_) => Err(AdapterError::Decode("expected a card array".to_string())),
            None => Ok(None),
        }
    }

    /// Starter decks (`ST..`) live under a different path than booster sets.
    fn collection(set_code: &str) -> &'static str {
        if set_code.to_ascii_uppercase().starts_with("ST") {
            "decks"
        } else {
            "sets"
        }
    }
}

/// `OP01` → `OP-01`; already-dashed ids pass through.
pub fn api_set_id(set_code: &str) -> String {
    let code = set_code.trim().to_ascii_uppercase();
    if code.contains('-') {
        return code;
    }
    match code.find(|c: char| c.is_ascii_digit()) {
        Some(idx) if idx > 0 => format!("{}-{}", &code[..idx], &code[idx..]),
        _ => code,
    }
}

/// Keep numeric values, drop placeholders such as `"-"` or `"NULL"`.
fn numeric(value: Option<&Value>) -> Option<Value> {
    match value? {
        Value::Number(n) => Some(Value::Number(n.clone())),
        Value::String(s) if s.trim().parse::<u32>().is_ok() => Some(Value::String(s.trim().into())),
        _ => None,
    }
}

fn split_list(value: Option<&str>) -> Value {
    Value::Array(
        value
            .unwrap_or_default()
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()))
            .collect(),
    )
}

/// Map an OPTCG card object into factory fields.
pub fn normalize(card: &Value) -> RawCard {
    let mut f = Map::new();
    put(&mut f, "name", at(card, &["card_name"]));

    if let Some((set, number)) = str_at(card, &["card_set_id"]).and_then(|id| id.split_once('-')) {
        put_str(&mut f, "setCode", Some(set));
        // alternate arts carry a suffix such as "001_p1"
        let number = number.split('_').next().unwrap_or(number);
        put_str(&mut f, "cardNumber", Some(number));
    }
    put(&mut f, "setName", at(card, &["set_name"]));
    put(&mut f, "rarity", at(card, &["rarity"]));
    put(&mut f, "color", at(card, &["card_color"]));
    put(&mut f, "category", at(card, &["card_type"]));
    put(&mut f, "cost", numeric(at(card, &["card_cost"])).as_ref());
    put(&mut f, "power", numeric(at(card, &["card_power"])).as_ref());
    put(&mut f, "counter", numeric(at(card, &["counter_amount"])).as_ref());
    f.insert("attributes".into(), split_list(str_at(card, &["attribute"])));
    f.insert("types".into(), split_list(str_at(card, &["sub_types"])));

    if let Some(text) = str_at(card, &["card_text"]) {
        match text.split_once(TRIGGER_MARKER) {
            Some((effect, trigger)) => {
                put_str(&mut f, "effect", Some(effect.trim()).filter(|s| !s.is_empty()));
                put_str(&mut f, "trigger", Some(trigger.trim()).filter(|s| !s.is_empty()));
            }
            None => put_str(&mut f, "effect", Some(text.trim()).filter(|s| !s.is_empty())),
        }
    }
    put(&mut f, "imageUrl", at(card, &["card_image"]));

    let mut prices = Map::new();
    put(&mut prices, "usd", at(card, &["market_price"]));
    f.insert("prices".into(), Value::Object(prices));
    f
}

impl CardApi for OnePieceApi {
    fn game(&self) -> Game {
        Game::OnePiece
    }

    fn search_card(&self, query: &str) -> AdapterResult<Vec<CardDto>> {
        let url = format!("{}/sets/filtered/", self.base_url);
        match self.http.get_json(&url, &[("card_name", query.trim().to_string())])? {
            Some(Value::Array(items)) => Ok(items.iter().map(Self::to_dto).collect()),
            Some(_) | None => Ok(Vec::new()),
        }
    }

    fn get_card_by_set_and_number(
        &self,
        set_code: &str,
        number: &str,
    ) -> AdapterResult<Option<CardDto>> {
        let set = set_code.trim().replace('-', "").to_ascii_uppercase();
        let card_id = if number.contains('-') {
            number.trim().to_ascii_uppercase()
        } else {
            format!("{}-{}", set, number.trim())
        };
        let url = format!(
            "{}/{}/card/{}/",
            self.base_url,
            Self::collection(&set),
            card_id
        );
        let cards = self.cards_at(&url, false)?;
        // The base printing comes back alongside alternate arts.
        Ok(cards.and_then(|items| {
            items
                .iter()
                .find(|c| str_at(c, &["card_image_id"]) == Some(card_id.as_str()))
                .or_else(|| items.first())
                .map(Self::to_dto)
        }))
    }

    fn fetch_all_sets(&self) -> AdapterResult<Vec<SetSummary>> {
        let url = format!("{}/allSets/", self.base_url);
        let sets = match self.http.get_listing(&url, &[])? {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(AdapterError::Decode("expected a set array".to_string())),
            None => return Ok(Vec::new()),
        };
        Ok(sets
            .iter()
            .filter_map(|s| {
                Some(SetSummary {
                    code: str_at(s, &["set_id"])?.replace('-', ""),
                    name: str_at(s, &["set_name"])?.to_string(),
                })
            })
            .collect())
    }

    fn fetch_cards_in_set(&self, set_code: &str) -> AdapterResult<CardStream<'_>> {
        let url = format!(
            "{}/{}/{}/",
            self.base_url,
            Self::collection(set_code),
            api_set_id(set_code)
        );
        let mut fetched = false;

        // The whole set arrives in one response.
        let stream = Paged::new(move || {
            if fetched {
                return Ok(None);
            }
            fetched = true;
            Ok(self
                .cards_at(&url, true)?
                .map(|items| items.iter().map(normalize).collect()))
        });
        Ok(Box::new(stream))
    }
}
