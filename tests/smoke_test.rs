//! Live smoke test against the real card APIs.
//!
//! Needs network access. Run with:
//! ```sh
//! cargo test --test smoke_test -- --ignored --nocapture
//! ```

use tcgsync::{CardRepository, Game, TcgSync, Tier};

fn client(tmp: &tempfile::TempDir) -> TcgSync {
    TcgSync::builder()
        .cache_dir(tmp.path().join("cache"))
        .database(tmp.path().join("cards.duckdb"))
        .build()
        .unwrap()
}

/// Resolve one well-known card per game twice and report the tiers.
#[test]
#[ignore]
fn resolves_one_card_per_game() {
    let tmp = tempfile::tempdir().unwrap();
    let client = client(&tmp);

    for (game, set, number) in [
        ("mtg", "m10", "146"),
        ("pokemon", "base1", "4"),
        ("onepiece", "OP01", "OP01-001"),
    ] {
        let first = client.resolver().resolve_traced(game, set, number, true).unwrap();
        let Some((card, tier)) = first else {
            eprintln!("  [SKIP] {game} {set}/{number}: not found upstream");
            continue;
        };
        eprintln!("  [PASS] {game} {set}/{number} -> {} via {tier}", card.name);
        assert_eq!(tier, Tier::Remote);

        let (again, tier) = client
            .resolver()
            .resolve_traced(game, set, number, true)
            .unwrap()
            .unwrap();
        assert_eq!(tier, Tier::Cache);
        assert_eq!(again.id, card.id);
    }
}

#[test]
#[ignore]
fn lists_sets_and_searches() {
    let tmp = tempfile::tempdir().unwrap();
    let client = client(&tmp);

    for game in [Game::Mtg, Game::Pokemon, Game::OnePiece] {
        let sets = client.resolver().sets(game).unwrap();
        eprintln!("  {game}: {} sets", sets.len());
        assert!(!sets.is_empty(), "{game} set list is empty");
    }

    let hits = client.resolver().search_remote(Game::Mtg, "lightning bolt").unwrap();
    eprintln!("  scryfall search: {} hits", hits.len());
    assert!(hits.iter().any(|c| c.name == "Lightning Bolt"));
}

#[test]
#[ignore]
fn syncs_a_small_set() {
    let tmp = tempfile::tempdir().unwrap();
    let client = client(&tmp);

    let report = client
        .bulk_sync()
        .run(Game::OnePiece, Some("ST01"), Default::default())
        .unwrap();
    eprintln!("  ST01: {report:?}");
    assert!(report.saved > 0);
    assert_eq!(client.cards().count_by_game(Game::OnePiece).unwrap(), report.saved as u64);
}
