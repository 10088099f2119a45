//! CardFactory construction and field coercion.

mod common;

use serde_json::{json, Map, Value};
use tcgsync::models::CardPayload;
use tcgsync::{CardFactory, Game, TcgSyncError};

// ---------------------------------------------------------------------------
// Game tags
// ---------------------------------------------------------------------------

#[test]
fn game_tags_accept_aliases_in_any_case() {
    for (tag, game) in [
        ("mtg", Game::Mtg),
        ("Magic", Game::Mtg),
        ("POKEMON", Game::Pokemon),
        ("ptcg", Game::Pokemon),
        ("onepiece", Game::OnePiece),
        (" OPCG ", Game::OnePiece),
    ] {
        assert_eq!(Game::parse(tag).unwrap(), game, "tag {tag:?}");
    }
}

#[test]
fn unknown_game_tag_is_rejected() {
    let err = CardFactory::create("yugioh", &common::lightning_bolt()).unwrap_err();
    assert!(matches!(err, TcgSyncError::UnknownGameKind(tag) if tag == "yugioh"));
}

#[test]
fn alias_builds_same_variant_as_canonical_tag() {
    let a = CardFactory::create("magic", &common::lightning_bolt()).unwrap();
    let b = CardFactory::create("mtg", &common::lightning_bolt()).unwrap();
    assert_eq!(a.game(), Game::Mtg);
    assert_eq!(a.payload, b.payload);
}

// ---------------------------------------------------------------------------
// Per-game construction
// ---------------------------------------------------------------------------

#[test]
fn builds_mtg_card_with_coerced_prices() {
    let card = CardFactory::create("mtg", &common::lightning_bolt()).unwrap();
    assert_eq!(card.name, "Lightning Bolt");
    assert_eq!(card.set_code(), "M10");
    assert_eq!(card.number(), "146");
    let CardPayload::Mtg(mtg) = &card.payload else {
        panic!("expected an mtg payload");
    };
    assert_eq!(mtg.mana_cost.as_deref(), Some("{R}"));
    assert!(mtg.colors.contains("R"));
    assert_eq!(mtg.prices.usd, Some(1.25));
    assert_eq!(mtg.prices.eur, Some(0.9));
    assert_eq!(mtg.prices.tix, None);
}

#[test]
fn builds_pokemon_card_with_nested_structures() {
    let card = CardFactory::create("pokemon", &common::charizard()).unwrap();
    let CardPayload::Pokemon(p) = &card.payload else {
        panic!("expected a pokemon payload");
    };
    assert_eq!(p.hp, Some(120));
    assert_eq!(p.attacks.len(), 1);
    assert_eq!(p.attacks[0].name, "Fire Spin");
    assert_eq!(p.attacks[0].converted_energy_cost, Some(4));
    assert_eq!(p.weaknesses[0].type_field, "Water");
    assert_eq!(p.retreat_cost, Some(3));
    assert_eq!(p.national_pokedex_number, Some(6));
}

#[test]
fn builds_onepiece_leader() {
    let card = CardFactory::create("onepiece", &common::luffy_leader()).unwrap();
    assert!(card.is_leader());
    let CardPayload::OnePiece(op) = &card.payload else {
        panic!("expected a one piece payload");
    };
    assert_eq!(op.power, Some(5000));
    assert_eq!(op.cost, None);
    assert_eq!(op.types, vec!["Supernovas", "Straw Hat Crew"]);
    assert_eq!(op.prices.usd, Some(0.5));
}

#[test]
fn absent_optional_fields_keep_defaults() {
    let card = CardFactory::create("pokemon", &common::basic_energy("Fire Energy", "2")).unwrap();
    let CardPayload::Pokemon(p) = &card.payload else {
        panic!("expected a pokemon payload");
    };
    assert!(p.subtypes.is_empty());
    assert!(p.attacks.is_empty());
    assert_eq!(p.hp, None);
    assert_eq!(p.rarity, "");
    assert!(card.is_basic_energy());
}

#[test]
fn null_counts_as_absent() {
    let mut fields = common::lightning_bolt();
    fields.insert("manaCost".into(), Value::Null);
    fields.insert("colors".into(), Value::Null);
    let card = CardFactory::create("mtg", &fields).unwrap();
    let CardPayload::Mtg(mtg) = &card.payload else {
        panic!("expected an mtg payload");
    };
    assert_eq!(mtg.mana_cost, None);
    assert!(mtg.colors.is_empty());
}

#[test]
fn numeric_power_is_stringified() {
    let mut fields = common::mtg_card("Grizzly Bears", "M10", "180");
    fields.insert("power".into(), json!(2));
    let card = CardFactory::create("mtg", &fields).unwrap();
    let CardPayload::Mtg(mtg) = &card.payload else {
        panic!("expected an mtg payload");
    };
    assert_eq!(mtg.power.as_deref(), Some("2"));
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[test]
fn id_is_kept_when_given() {
    let mut fields = common::lightning_bolt();
    fields.insert("id".into(), json!("card-1"));
    let card = CardFactory::create("mtg", &fields).unwrap();
    assert_eq!(card.id, "card-1");
}

#[test]
fn id_is_generated_when_missing() {
    let a = CardFactory::create("mtg", &common::lightning_bolt()).unwrap();
    let b = CardFactory::create("mtg", &common::lightning_bolt()).unwrap();
    assert!(!a.id.is_empty());
    assert_ne!(a.id, b.id);
}

#[test]
fn to_fields_round_trips_through_factory() {
    for (game, fields) in [
        (Game::Mtg, common::lightning_bolt()),
        (Game::Pokemon, common::charizard()),
        (Game::OnePiece, common::luffy_leader()),
    ] {
        let card = CardFactory::create_for(game, &fields).unwrap();
        let rebuilt = CardFactory::from_value(&Value::Object(card.to_fields())).unwrap();
        assert_eq!(rebuilt, card, "{game}");
    }
}

#[test]
fn from_value_requires_a_game() {
    let err = CardFactory::from_value(&Value::Object(common::lightning_bolt())).unwrap_err();
    assert!(matches!(err, TcgSyncError::UnknownGameKind(_)));
}

// ---------------------------------------------------------------------------
// Invalid fields
// ---------------------------------------------------------------------------

#[test]
fn missing_name_is_invalid() {
    let mut fields = common::lightning_bolt();
    fields.remove("name");
    let err = CardFactory::create("mtg", &fields).unwrap_err();
    assert!(matches!(err, TcgSyncError::InvalidField { ref field, .. } if field == "name"));
}

#[test]
fn wrong_shape_names_the_field() {
    let mut fields = common::charizard();
    fields.insert("hp".into(), json!("lots"));
    let err = CardFactory::create("pokemon", &fields).unwrap_err();
    match err {
        TcgSyncError::InvalidField { game, field, .. } => {
            assert_eq!(game, "pokemon");
            assert_eq!(field, "hp");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn nested_field_errors_carry_the_path() {
    let mut fields = common::lightning_bolt();
    fields.insert("prices".into(), json!({ "usd": "n/a" }));
    let err = CardFactory::create("mtg", &fields).unwrap_err();
    assert!(matches!(err, TcgSyncError::InvalidField { ref field, .. } if field == "prices.usd"));
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

#[test]
fn batch_preserves_order_and_isolates_failures() {
    let mut broken = common::mtg_card("Broken", "M10", "1");
    broken.insert("colors".into(), json!("R"));
    let records: Vec<Map<String, Value>> = vec![
        common::mtg_card("First", "M10", "10"),
        broken,
        common::mtg_card("Third", "M10", "30"),
    ];

    let results = CardFactory::create_batch("mtg", &records);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().name, "First");
    assert!(results[1].is_err());
    assert_eq!(results[2].as_ref().unwrap().name, "Third");
}

#[test]
fn batch_with_unknown_game_fails_every_record() {
    let records = vec![common::lightning_bolt(), common::lightning_bolt()];
    let results = CardFactory::create_batch("netrunner", &records);
    assert_eq!(results.len(), 2);
    assert!(results
        .iter()
        .all(|r| matches!(r, Err(TcgSyncError::UnknownGameKind(_)))));
}
