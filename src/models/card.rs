use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::game::{Game, NaturalKey};
use super::sub::{Attack, MtgPrices, OnePiecePrices, PokemonPrices, TypeModifier};

// ---------------------------------------------------------------------------
// Card: shared identity plus exactly one game payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub payload: CardPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CardPayload {
    Mtg(MtgCard),
    Pokemon(PokemonCard),
    OnePiece(OnePieceCard),
}

impl Card {
    pub fn game(&self) -> Game {
        match &self.payload {
            CardPayload::Mtg(_) => Game::Mtg,
            CardPayload::Pokemon(_) => Game::Pokemon,
            CardPayload::OnePiece(_) => Game::OnePiece,
        }
    }

    pub fn set_code(&self) -> &str {
        match &self.payload {
            CardPayload::Mtg(c) => &c.set_code,
            CardPayload::Pokemon(c) => &c.set_id,
            CardPayload::OnePiece(c) => &c.set_code,
        }
    }

    pub fn set_name(&self) -> &str {
        match &self.payload {
            CardPayload::Mtg(c) => &c.set_name,
            CardPayload::Pokemon(c) => &c.set_name,
            CardPayload::OnePiece(c) => &c.set_name,
        }
    }

    pub fn number(&self) -> &str {
        match &self.payload {
            CardPayload::Mtg(c) => &c.collector_number,
            CardPayload::Pokemon(c) => &c.number,
            CardPayload::OnePiece(c) => &c.card_number,
        }
    }

    pub fn rarity(&self) -> &str {
        match &self.payload {
            CardPayload::Mtg(c) => &c.rarity,
            CardPayload::Pokemon(c) => &c.rarity,
            CardPayload::OnePiece(c) => &c.rarity,
        }
    }

    pub fn artist(&self) -> Option<&str> {
        match &self.payload {
            CardPayload::Mtg(c) => c.artist.as_deref(),
            CardPayload::Pokemon(c) => c.artist.as_deref(),
            CardPayload::OnePiece(c) => c.artist.as_deref(),
        }
    }

    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey::new(self.game(), self.set_code(), self.number())
    }

    /// True for the five Magic basic land names.
    pub fn is_basic_land(&self) -> bool {
        matches!(self.payload, CardPayload::Mtg(_))
            && crate::config::BASIC_LANDS.contains(&self.name.as_str())
    }

    /// A Pokémon Energy card without subtypes.
    pub fn is_basic_energy(&self) -> bool {
        match &self.payload {
            CardPayload::Pokemon(c) => {
                c.supertype
                    .as_deref()
                    .is_some_and(|s| s.eq_ignore_ascii_case("Energy"))
                    && c.subtypes.is_empty()
            }
            _ => false,
        }
    }

    pub fn is_leader(&self) -> bool {
        match &self.payload {
            CardPayload::OnePiece(c) => c
                .category
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("Leader")),
            _ => false,
        }
    }

    /// Flatten into the camelCase field map accepted by
    /// [`CardFactory::create`](crate::factory::CardFactory::create).
    ///
    /// This is also the representation written to the cache and the
    /// `fields` column of the card store.
    pub fn to_fields(&self) -> Map<String, Value> {
        let payload = match &self.payload {
            CardPayload::Mtg(c) => serde_json::to_value(c),
            CardPayload::Pokemon(c) => serde_json::to_value(c),
            CardPayload::OnePiece(c) => serde_json::to_value(c),
        };
        let mut fields = match payload {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        fields.insert("id".into(), Value::String(self.id.clone()));
        fields.insert("name".into(), Value::String(self.name.clone()));
        fields.insert("game".into(), Value::String(self.game().as_str().into()));
        if let Some(url) = &self.image_url {
            fields.insert("imageUrl".into(), Value::String(url.clone()));
        }
        fields
    }
}

// ---------------------------------------------------------------------------
// MtgCard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MtgCard {
    pub set_code: String,
    pub set_name: String,
    pub collector_number: String,
    pub rarity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mana_cost: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oracle_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toughness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loyalty: Option<String>,
    pub colors: BTreeSet<String>,
    pub color_identity: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    pub is_foil: bool,
    pub prices: MtgPrices,
}

// ---------------------------------------------------------------------------
// PokemonCard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PokemonCard {
    pub set_id: String,
    pub set_name: String,
    pub number: String,
    pub rarity: String,
    /// Pokémon, Trainer or Energy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supertype: Option<String>,
    pub subtypes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hp: Option<u32>,
    pub types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evolves_from: Option<String>,
    pub attacks: Vec<Attack>,
    pub weaknesses: Vec<TypeModifier>,
    pub resistances: Vec<TypeModifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retreat_cost: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_pokedex_number: Option<u32>,
    pub prices: PokemonPrices,
}

// ---------------------------------------------------------------------------
// OnePieceCard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OnePieceCard {
    pub set_code: String,
    pub set_name: String,
    pub card_number: String,
    pub rarity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Leader, Character, Event or Stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter: Option<u32>,
    pub attributes: Vec<String>,
    pub types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    pub prices: OnePiecePrices,
}
