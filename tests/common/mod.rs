//! Shared test fixtures for the tcgsync integration tests.
//!
//! Provides sample field maps for each game, a scripted in-process
//! [`CardApi`] that counts how often it is called, and a helper that wires
//! a resolver over in-memory stores.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Map, Value};

use tcgsync::adapters::{AdapterError, AdapterResult, CardApi, CardStream, RawCard};
use tcgsync::cache::MemoryCache;
use tcgsync::models::{CardDto, DtoPrices, SetSummary};
use tcgsync::repository::MemoryCardRepository;
use tcgsync::{Card, CardFactory, CardResolver, Game};

// ---------------------------------------------------------------------------
// Sample records
// ---------------------------------------------------------------------------

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture is not an object: {other}"),
    }
}

pub fn lightning_bolt() -> Map<String, Value> {
    object(json!({
        "name": "Lightning Bolt",
        "setCode": "M10",
        "setName": "Magic 2010",
        "collectorNumber": "146",
        "rarity": "common",
        "manaCost": "{R}",
        "typeLine": "Instant",
        "oracleText": "Lightning Bolt deals 3 damage to any target.",
        "colors": ["R"],
        "colorIdentity": ["R"],
        "artist": "Christopher Moeller",
        "imageUrl": "https://cards.scryfall.io/normal/front/m10-146.jpg",
        "prices": { "usd": "1.25", "eur": 0.9 }
    }))
}

pub fn mtg_card(name: &str, set: &str, number: &str) -> Map<String, Value> {
    object(json!({
        "name": name,
        "setCode": set,
        "setName": "Test Set",
        "collectorNumber": number,
        "rarity": "common",
        "typeLine": "Creature"
    }))
}

pub fn charizard() -> Map<String, Value> {
    object(json!({
        "name": "Charizard",
        "setId": "base1",
        "setName": "Base",
        "number": "4",
        "rarity": "Rare Holo",
        "supertype": "Pokémon",
        "subtypes": ["Stage 2"],
        "hp": "120",
        "types": ["Fire"],
        "evolvesFrom": "Charmeleon",
        "attacks": [{
            "name": "Fire Spin",
            "cost": ["Fire", "Fire", "Fire", "Fire"],
            "convertedEnergyCost": 4,
            "damage": "100",
            "text": "Discard 2 Energy cards attached to Charizard in order to use this attack."
        }],
        "weaknesses": [{ "type": "Water", "value": "×2" }],
        "resistances": [{ "type": "Fighting", "value": "-30" }],
        "retreatCost": 3,
        "artist": "Mitsuhiro Arita",
        "nationalPokedexNumber": 6,
        "imageUrl": "https://images.pokemontcg.io/base1/4_hires.png",
        "prices": { "usd": 350.0 }
    }))
}

pub fn pokemon_card(name: &str, number: &str) -> Map<String, Value> {
    object(json!({
        "name": name,
        "setId": "sv1",
        "setName": "Scarlet & Violet",
        "number": number,
        "rarity": "Common",
        "supertype": "Pokémon",
        "subtypes": ["Basic"],
    }))
}

pub fn basic_energy(name: &str, number: &str) -> Map<String, Value> {
    object(json!({
        "name": name,
        "setId": "sve",
        "number": number,
        "supertype": "Energy",
    }))
}

pub fn special_energy(name: &str, number: &str) -> Map<String, Value> {
    object(json!({
        "name": name,
        "setId": "sv2",
        "number": number,
        "supertype": "Energy",
        "subtypes": ["Special"],
    }))
}

pub fn luffy_leader() -> Map<String, Value> {
    object(json!({
        "name": "Monkey.D.Luffy",
        "setCode": "OP01",
        "setName": "Romance Dawn",
        "cardNumber": "003",
        "rarity": "L",
        "color": "Red",
        "category": "Leader",
        "power": 5000,
        "attributes": ["Strike"],
        "types": ["Supernovas", "Straw Hat Crew"],
        "effect": "[Activate: Main] [Once Per Turn] Give this Leader or 1 of your Characters up to 1 rested DON!! card.",
        "prices": { "usd": "0.50" }
    }))
}

pub fn onepiece_card(name: &str, number: &str, category: &str) -> Map<String, Value> {
    object(json!({
        "name": name,
        "setCode": "OP01",
        "cardNumber": number,
        "rarity": "C",
        "category": category,
        "cost": 2,
    }))
}

/// Build a card from a fixture, panicking on bad fixtures.
pub fn card(game: Game, fields: Map<String, Value>) -> Card {
    CardFactory::create_for(game, &fields).unwrap()
}

// ---------------------------------------------------------------------------
// FakeApi
// ---------------------------------------------------------------------------

/// Scripted card API. Single-card lookups are counted so tests can assert
/// which tier answered.
pub struct FakeApi {
    game: Game,
    cards: Mutex<HashMap<(String, String), RawCard>>,
    sets: Vec<SetSummary>,
    set_cards: HashMap<String, Vec<AdapterResult<RawCard>>>,
    failing: bool,
    pub lookups: AtomicUsize,
    pub set_listings: AtomicUsize,
}

impl FakeApi {
    pub fn new(game: Game) -> Self {
        Self {
            game,
            cards: Mutex::new(HashMap::new()),
            sets: Vec::new(),
            set_cards: HashMap::new(),
            failing: false,
            lookups: AtomicUsize::new(0),
            set_listings: AtomicUsize::new(0),
        }
    }

    /// An API whose every call fails with a 503.
    pub fn failing(game: Game) -> Self {
        Self {
            failing: true,
            ..Self::new(game)
        }
    }

    pub fn with_card(self, set: &str, number: &str, fields: RawCard) -> Self {
        self.put(set, number, fields);
        self
    }

    /// Replace what the API returns for one key.
    pub fn put(&self, set: &str, number: &str, fields: RawCard) {
        self.cards
            .lock()
            .unwrap()
            .insert((set.to_lowercase(), number.to_lowercase()), fields);
    }

    pub fn with_set(mut self, code: &str, name: &str, records: Vec<AdapterResult<RawCard>>) -> Self {
        self.sets.push(SetSummary {
            code: code.to_string(),
            name: name.to_string(),
        });
        self.set_cards.insert(code.to_string(), records);
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn dto(&self, fields: RawCard) -> CardDto {
        let get = |k: &str| fields.get(k).and_then(Value::as_str).unwrap_or_default().to_string();
        CardDto {
            id: format!("ext-{}", get("name")),
            name: get("name"),
            game: self.game,
            set: String::new(),
            set_name: get("setName"),
            number: String::new(),
            rarity: get("rarity"),
            image_url: fields.get("imageUrl").and_then(Value::as_str).map(str::to_string),
            artist: None,
            is_foil: false,
            prices: DtoPrices::default(),
            type_field: None,
            text: None,
            fields,
        }
    }
}

impl CardApi for FakeApi {
    fn game(&self) -> Game {
        self.game
    }

    fn search_card(&self, query: &str) -> AdapterResult<Vec<CardDto>> {
        if self.failing {
            return Err(AdapterError::Status(503));
        }
        let needle = query.to_lowercase();
        let cards = self.cards.lock().unwrap();
        Ok(cards
            .values()
            .filter(|f| {
                f.get("name")
                    .and_then(Value::as_str)
                    .is_some_and(|n| n.to_lowercase().contains(&needle))
            })
            .map(|f| self.dto(f.clone()))
            .collect())
    }

    fn get_card_by_set_and_number(&self, set_code: &str, number: &str) -> AdapterResult<Option<CardDto>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(AdapterError::Status(503));
        }
        let fields = self
            .cards
            .lock()
            .unwrap()
            .get(&(set_code.to_lowercase(), number.to_lowercase()))
            .cloned();
        Ok(fields.map(|f| self.dto(f)))
    }

    fn fetch_all_sets(&self) -> AdapterResult<Vec<SetSummary>> {
        self.set_listings.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(AdapterError::Status(503));
        }
        Ok(self.sets.clone())
    }

    fn fetch_cards_in_set(&self, set_code: &str) -> AdapterResult<CardStream<'_>> {
        if self.failing {
            return Err(AdapterError::Status(503));
        }
        let records: Vec<AdapterResult<RawCard>> = self
            .set_cards
            .get(set_code)
            .map(|records| {
                records
                    .iter()
                    .map(|r| match r {
                        Ok(raw) => Ok(raw.clone()),
                        Err(_) => Err(AdapterError::Decode("scripted failure".to_string())),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(Box::new(records.into_iter()))
    }
}

// ---------------------------------------------------------------------------
// Resolver wiring
// ---------------------------------------------------------------------------

pub struct Harness {
    pub cache: Arc<MemoryCache>,
    pub repo: Arc<MemoryCardRepository>,
    pub api: Arc<FakeApi>,
    pub resolver: CardResolver,
}

/// A resolver over in-memory stores with `api` registered.
pub fn harness(api: FakeApi) -> Harness {
    let cache = Arc::new(MemoryCache::new());
    let repo = Arc::new(MemoryCardRepository::new());
    let api = Arc::new(api);
    let resolver = CardResolver::new(cache.clone(), repo.clone()).with_adapter(api.clone());
    Harness {
        cache,
        repo,
        api,
        resolver,
    }
}
