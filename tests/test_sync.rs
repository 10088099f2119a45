//! Bulk set import and image handling.

mod common;

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::{json, Map, Value};
use tcgsync::adapters::{AdapterError, AdapterResult};
use tcgsync::repository::CardRepository;
use tcgsync::sync::FsImageStore;
use tcgsync::{BulkSync, CacheStore, Card, Game, ImageStore, SyncOptions, SyncReport, TcgSyncError};

use common::FakeApi;

fn with_image(mut fields: Map<String, Value>, url: &str) -> Map<String, Value> {
    fields.insert("imageUrl".into(), json!(url));
    fields
}

fn tst_records() -> Vec<AdapterResult<Map<String, Value>>> {
    vec![
        Ok(with_image(common::mtg_card("Alpha", "TST", "1"), "https://img.test/1.jpg")),
        Err(AdapterError::Decode("truncated page".into())),
        Ok(with_image(common::mtg_card("Beta", "TST", "2"), "https://img.test/2.jpg")),
        Ok(common::mtg_card("Gamma", "TST", "3")),
    ]
}

fn tst_api() -> FakeApi {
    FakeApi::new(Game::Mtg).with_set("TST", "Test Set", tst_records())
}

/// Records downloads instead of performing them.
#[derive(Default)]
struct RecordingImages {
    present: Mutex<HashSet<String>>,
    stored: Mutex<Vec<String>>,
}

impl RecordingImages {
    fn holding(numbers: &[&str]) -> Self {
        let images = Self::default();
        images
            .present
            .lock()
            .unwrap()
            .extend(numbers.iter().map(|n| n.to_string()));
        images
    }

    fn stored(&self) -> Vec<String> {
        self.stored.lock().unwrap().clone()
    }
}

impl ImageStore for RecordingImages {
    fn has_image(&self, card: &Card) -> bool {
        self.present.lock().unwrap().contains(card.number())
    }

    fn store(&self, card: &Card, url: &str) -> tcgsync::Result<()> {
        self.stored.lock().unwrap().push(url.to_string());
        self.present.lock().unwrap().insert(card.number().to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Card import
// ---------------------------------------------------------------------------

#[test]
fn imports_a_set_and_counts_bad_records() {
    let h = common::harness(tst_api());

    let report = BulkSync::new(&h.resolver)
        .run(Game::Mtg, Some("TST"), SyncOptions::default())
        .unwrap();

    assert_eq!(
        report,
        SyncReport {
            saved: 3,
            skipped: 0,
            errored: 1,
            image_skipped: 0,
            image_errored: 0,
        }
    );
    assert_eq!(h.repo.count_by_game(Game::Mtg).unwrap(), 3);
    assert!(h.cache.get("mtg:tst:2").unwrap().is_some());
}

#[test]
fn all_sets_are_imported_when_none_is_named() {
    let api = tst_api().with_set("TS2", "Second", vec![Ok(common::mtg_card("Delta", "TS2", "1"))]);
    let h = common::harness(api);

    let report = BulkSync::new(&h.resolver)
        .run(Game::Mtg, None, SyncOptions::default())
        .unwrap();
    assert_eq!(report.saved, 4);
    assert_eq!(h.repo.count_by_game(Game::Mtg).unwrap(), 4);
}

#[test]
fn existing_cards_are_skipped_unless_updating() {
    let h = common::harness(tst_api());
    let sync = BulkSync::new(&h.resolver);
    sync.run(Game::Mtg, Some("TST"), SyncOptions::default()).unwrap();
    let before = h.repo.find_by_set_and_number(Game::Mtg, "TST", "1").unwrap().unwrap();

    let again = sync.run(Game::Mtg, Some("TST"), SyncOptions::default()).unwrap();
    assert_eq!((again.saved, again.skipped), (0, 3));

    let updated = sync
        .run(
            Game::Mtg,
            Some("TST"),
            SyncOptions {
                update_existing: true,
                ..SyncOptions::default()
            },
        )
        .unwrap();
    assert_eq!((updated.saved, updated.skipped), (3, 0));

    let after = h.repo.find_by_set_and_number(Game::Mtg, "TST", "1").unwrap().unwrap();
    assert_eq!(after.id, before.id, "stored id survives an update");
    assert_eq!(h.repo.count_by_game(Game::Mtg).unwrap(), 3);
}

#[test]
fn unreachable_set_is_skipped() {
    let h = common::harness(FakeApi::failing(Game::Mtg));
    let report = BulkSync::new(&h.resolver)
        .run(Game::Mtg, Some("TST"), SyncOptions::default())
        .unwrap();
    assert_eq!(report, SyncReport::default());
}

#[test]
fn game_without_adapter_is_rejected() {
    let h = common::harness(tst_api());
    let err = BulkSync::new(&h.resolver)
        .run(Game::Pokemon, None, SyncOptions::default())
        .unwrap_err();
    assert!(matches!(err, TcgSyncError::InvalidArgument(_)));
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

#[test]
fn images_are_stored_for_cards_with_urls() {
    let h = common::harness(tst_api());
    let images = RecordingImages::default();

    BulkSync::new(&h.resolver)
        .with_images(&images)
        .run(Game::Mtg, Some("TST"), SyncOptions::default())
        .unwrap();
    assert_eq!(images.stored(), ["https://img.test/1.jpg", "https://img.test/2.jpg"]);
}

#[test]
fn existing_images_are_skipped_when_asked() {
    let h = common::harness(tst_api());
    let images = RecordingImages::holding(&["1"]);

    let report = BulkSync::new(&h.resolver)
        .with_images(&images)
        .run(
            Game::Mtg,
            Some("TST"),
            SyncOptions {
                skip_existing_images: true,
                ..SyncOptions::default()
            },
        )
        .unwrap();
    assert_eq!(report.image_skipped, 1);
    assert_eq!(images.stored(), ["https://img.test/2.jpg"]);
}

#[test]
fn existing_images_are_refreshed_by_default() {
    let h = common::harness(tst_api());
    let images = RecordingImages::holding(&["1", "2"]);

    let report = BulkSync::new(&h.resolver)
        .with_images(&images)
        .run(Game::Mtg, Some("TST"), SyncOptions::default())
        .unwrap();
    assert_eq!(report.image_skipped, 0);
    assert_eq!(images.stored().len(), 2);
}

/// Refuses every download.
struct BrokenImages;

impl ImageStore for BrokenImages {
    fn has_image(&self, _card: &Card) -> bool {
        false
    }

    fn store(&self, _card: &Card, url: &str) -> tcgsync::Result<()> {
        Err(TcgSyncError::InvalidArgument(format!("no route to {url}")))
    }
}

#[test]
fn failed_image_downloads_are_counted() {
    let h = common::harness(tst_api());

    let report = BulkSync::new(&h.resolver)
        .with_images(&BrokenImages)
        .run(Game::Mtg, Some("TST"), SyncOptions::default())
        .unwrap();
    assert_eq!(report.image_errored, 2);
    assert_eq!(report.saved, 3, "cards are kept when their image fails");
    assert_eq!(h.repo.count_by_game(Game::Mtg).unwrap(), 3);
}

#[test]
fn fs_image_paths_follow_game_set_and_number() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(tmp.path(), Duration::from_secs(5)).unwrap();

    let bolt = common::card(Game::Mtg, common::lightning_bolt());
    assert_eq!(store.image_path(&bolt), tmp.path().join("mtg/m10/146.jpg"));

    let charizard = common::card(Game::Pokemon, common::charizard());
    assert_eq!(store.image_path(&charizard), tmp.path().join("pokemon/base1/4.png"));

    let mut fields = common::luffy_leader();
    fields.insert("imageUrl".into(), json!("https://img.test/OP01-003.webp?v=2"));
    let luffy = common::card(Game::OnePiece, fields);
    assert_eq!(store.image_path(&luffy), tmp.path().join("onepiece/op01/003.webp"));

    let bare = common::card(Game::Mtg, common::mtg_card("Plain", "TST", "7"));
    assert_eq!(store.image_path(&bare), tmp.path().join("mtg/tst/7.jpg"));
    assert!(!store.has_image(&bare));
}
