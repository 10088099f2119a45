//! Builds concrete card variants from loosely-typed field maps.
//!
//! The field vocabulary is the camelCase one produced by
//! [`Card::to_fields`]; external adapters normalize their API records into
//! it, and cache entries and stored rows use it verbatim.
//!
//! Absent fields (or explicit `null`) keep the variant defaults: empty
//! collections and `None` scalars. A field that is present with the wrong
//! shape fails the whole record with [`TcgSyncError::InvalidField`].

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Result, TcgSyncError};
use crate::models::{
    Card, CardPayload, Game, MtgCard, MtgPrices, OnePieceCard, OnePiecePrices, PokemonCard,
    PokemonPrices,
};

pub struct CardFactory;

impl CardFactory {
    /// Build a card for the given game tag.
    ///
    /// The tag is normalized with [`Game::parse`], so `"Magic"`, `"PTCG"`
    /// and `"opcg"` are accepted alongside the canonical spellings.
    pub fn create(game: &str, fields: &Map<String, Value>) -> Result<Card> {
        Self::create_for(Game::parse(game)?, fields)
    }

    /// Build a card for an already-parsed game.
    pub fn create_for(game: Game, fields: &Map<String, Value>) -> Result<Card> {
        let reader = FieldReader::new(game, fields);

        let name = reader.required_string("name")?;
        let id = reader
            .string("id")?
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let image_url = reader.string("imageUrl")?;

        let payload = match game {
            Game::Mtg => CardPayload::Mtg(mtg_payload(&reader)?),
            Game::Pokemon => CardPayload::Pokemon(pokemon_payload(&reader)?),
            Game::OnePiece => CardPayload::OnePiece(onepiece_payload(&reader)?),
        };

        Ok(Card {
            id,
            name,
            image_url,
            payload,
        })
    }

    /// Build a card from a self-describing map that carries its own `game`.
    pub fn from_value(value: &Value) -> Result<Card> {
        let fields = value.as_object().ok_or_else(|| {
            TcgSyncError::InvalidArgument("card record must be a JSON object".to_string())
        })?;
        let game = fields
            .get("game")
            .and_then(Value::as_str)
            .ok_or_else(|| TcgSyncError::UnknownGameKind(String::new()))?;
        Self::create(game, fields)
    }

    /// Build many records of one game.
    ///
    /// Results line up with the input; a bad record yields an `Err` in its
    /// slot and does not stop the rest of the batch.
    pub fn create_batch(game: &str, records: &[Map<String, Value>]) -> Vec<Result<Card>> {
        match Game::parse(game) {
            Ok(game) => records
                .iter()
                .map(|fields| Self::create_for(game, fields))
                .collect(),
            Err(_) => records
                .iter()
                .map(|_| Err(TcgSyncError::UnknownGameKind(game.to_string())))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Payload builders
// ---------------------------------------------------------------------------

fn mtg_payload(r: &FieldReader<'_>) -> Result<MtgCard> {
    let prices = match r.nested("prices")? {
        Some(p) => MtgPrices {
            usd: p.price("usd")?,
            eur: p.price("eur")?,
            tix: p.price("tix")?,
        },
        None => MtgPrices::default(),
    };

    Ok(MtgCard {
        set_code: r.required_string("setCode")?,
        set_name: r.text("setName")?,
        collector_number: r.required_string("collectorNumber")?,
        rarity: r.text("rarity")?,
        mana_cost: r.string("manaCost")?,
        type_line: r.string("typeLine")?,
        oracle_text: r.string("oracleText")?,
        power: r.string("power")?,
        toughness: r.string("toughness")?,
        loyalty: r.string("loyalty")?,
        colors: r.set("colors")?,
        color_identity: r.set("colorIdentity")?,
        artist: r.string("artist")?,
        is_foil: r.flag("isFoil")?,
        prices,
    })
}

fn pokemon_payload(r: &FieldReader<'_>) -> Result<PokemonCard> {
    let prices = match r.nested("prices")? {
        Some(p) => PokemonPrices {
            usd: p.price("usd")?,
            eur: p.price("eur")?,
        },
        None => PokemonPrices::default(),
    };

    Ok(PokemonCard {
        set_id: r.required_string("setId")?,
        set_name: r.text("setName")?,
        number: r.required_string("number")?,
        rarity: r.text("rarity")?,
        supertype: r.string("supertype")?,
        subtypes: r.list("subtypes")?,
        hp: r.uint("hp")?,
        types: r.list("types")?,
        evolves_from: r.string("evolvesFrom")?,
        attacks: r.structured("attacks")?,
        weaknesses: r.structured("weaknesses")?,
        resistances: r.structured("resistances")?,
        retreat_cost: r.uint("retreatCost")?,
        artist: r.string("artist")?,
        national_pokedex_number: r.uint("nationalPokedexNumber")?,
        prices,
    })
}

fn onepiece_payload(r: &FieldReader<'_>) -> Result<OnePieceCard> {
    let prices = match r.nested("prices")? {
        Some(p) => OnePiecePrices {
            usd: p.price("usd")?,
            jpy: p.price("jpy")?,
        },
        None => OnePiecePrices::default(),
    };

    Ok(OnePieceCard {
        set_code: r.required_string("setCode")?,
        set_name: r.text("setName")?,
        card_number: r.required_string("cardNumber")?,
        rarity: r.text("rarity")?,
        color: r.string("color")?,
        category: r.string("category")?,
        cost: r.uint("cost")?,
        power: r.uint("power")?,
        counter: r.uint("counter")?,
        attributes: r.list("attributes")?,
        types: r.list("types")?,
        effect: r.string("effect")?,
        trigger: r.string("trigger")?,
        artist: r.string("artist")?,
        prices,
    })
}

// ---------------------------------------------------------------------------
// FieldReader
// ---------------------------------------------------------------------------

struct FieldReader<'a> {
    game: Game,
    fields: &'a Map<String, Value>,
    prefix: String,
}

impl<'a> FieldReader<'a> {
    fn new(game: Game, fields: &'a Map<String, Value>) -> Self {
        Self {
            game,
            fields,
            prefix: String::new(),
        }
    }

    fn invalid(&self, key: &str, reason: impl Into<String>) -> TcgSyncError {
        TcgSyncError::InvalidField {
            game: self.game.as_str(),
            field: format!("{}{}", self.prefix, key),
            reason: reason.into(),
        }
    }

    /// A present, non-null value.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    fn string(&self, key: &str) -> Result<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            // power/toughness and friends sometimes arrive as numbers
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(self.invalid(key, format!("expected string, got {}", other))),
        }
    }

    fn text(&self, key: &str) -> Result<String> {
        Ok(self.string(key)?.unwrap_or_default())
    }

    fn required_string(&self, key: &str) -> Result<String> {
        match self.string(key)? {
            Some(s) if !s.trim().is_empty() => Ok(s),
            _ => Err(self.invalid(key, "required field is missing or empty")),
        }
    }

    fn uint(&self, key: &str) -> Result<Option<u32>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| self.invalid(key, format!("expected unsigned integer, got {}", n))),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse::<u32>()
                .map(Some)
                .map_err(|_| self.invalid(key, format!("expected unsigned integer, got {:?}", s))),
            Some(other) => Err(self.invalid(key, format!("expected unsigned integer, got {}", other))),
        }
    }

    fn price(&self, key: &str) -> Result<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| self.invalid(key, format!("expected price, got {:?}", s))),
            Some(other) => Err(self.invalid(key, format!("expected price, got {}", other))),
        }
    }

    fn flag(&self, key: &str) -> Result<bool> {
        match self.get(key) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(self.invalid(key, format!("expected boolean, got {}", other))),
        }
    }

    fn list(&self, key: &str) -> Result<Vec<String>> {
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(self.invalid(key, format!("expected string element, got {}", other))),
                })
                .collect(),
            Some(other) => Err(self.invalid(key, format!("expected list, got {}", other))),
        }
    }

    fn set(&self, key: &str) -> Result<BTreeSet<String>> {
        Ok(self.list(key)?.into_iter().collect())
    }

    fn structured<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.get(key) {
            None => Ok(T::default()),
            Some(v) => serde_json::from_value(v.clone()).map_err(|e| self.invalid(key, e.to_string())),
        }
    }

    fn nested(&self, key: &str) -> Result<Option<FieldReader<'a>>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(FieldReader {
                game: self.game,
                fields: map,
                prefix: format!("{}{}.", self.prefix, key),
            })),
            Some(other) => Err(self.invalid(key, format!("expected object, got {}", other))),
        }
    }
}
