//! Operator-driven bulk import of whole sets.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;

use crate::config;
use crate::error::{Result, TcgSyncError};
use crate::factory::CardFactory;
use crate::models::{Card, Game};
use crate::resolver::CardResolver;

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Overwrite cards that are already stored. When off they are counted
    /// as skipped.
    pub update_existing: bool,
    /// Do not re-download images the image store already holds.
    pub skip_existing_images: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub saved: usize,
    pub skipped: usize,
    pub errored: usize,
    pub image_skipped: usize,
    /// Image downloads that failed. The card itself was still saved.
    pub image_errored: usize,
}

/// Local storage for card images.
pub trait ImageStore: Send + Sync {
    fn has_image(&self, card: &Card) -> bool;

    fn store(&self, card: &Card, url: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// FsImageStore
// ---------------------------------------------------------------------------

/// Downloads images to `<root>/<game>/<set>/<number>.<ext>`.
pub struct FsImageStore {
    root: PathBuf,
    client: Client,
}

impl FsImageStore {
    pub fn new<P: AsRef<Path>>(root: P, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config::USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            client,
        })
    }

    /// Where the image for `card` lives. The extension comes from the
    /// stored image URL and defaults to `jpg`.
    pub fn image_path(&self, card: &Card) -> PathBuf {
        let ext = card
            .image_url
            .as_deref()
            .map(|url| url.split(['?', '#']).next().unwrap_or(url))
            .and_then(|path| path.rsplit('/').next())
            .and_then(|file| file.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| matches!(ext.as_str(), "jpg" | "jpeg" | "png" | "webp"))
            .unwrap_or_else(|| "jpg".to_string());
        self.root
            .join(card.game().as_str())
            .join(path_segment(card.set_code()))
            .join(format!("{}.{}", path_segment(card.number()), ext))
    }
}

fn path_segment(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect()
}

impl ImageStore for FsImageStore {
    fn has_image(&self, card: &Card) -> bool {
        self.image_path(card).exists()
    }

    fn store(&self, card: &Card, url: &str) -> Result<()> {
        let dest = self.image_path(card);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = dest.with_extension("part");

        let result = (|| -> Result<()> {
            let resp = self.client.get(url).send()?.error_for_status()?;
            let bytes = resp.bytes()?;
            fs::write(&tmp, &bytes)?;
            fs::rename(&tmp, &dest)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }
}

// ---------------------------------------------------------------------------
// BulkSync
// ---------------------------------------------------------------------------

/// Pulls every card of a game (or one set) from its API into the store.
pub struct BulkSync<'a> {
    resolver: &'a CardResolver,
    images: Option<&'a dyn ImageStore>,
}

impl<'a> BulkSync<'a> {
    pub fn new(resolver: &'a CardResolver) -> Self {
        Self {
            resolver,
            images: None,
        }
    }

    pub fn with_images(mut self, images: &'a dyn ImageStore) -> Self {
        self.images = Some(images);
        self
    }

    /// Run the import.
    ///
    /// Fails only when the game has no adapter. Bad records, store errors
    /// and unreachable sets are logged and counted; the run continues.
    pub fn run(&self, game: Game, set: Option<&str>, options: SyncOptions) -> Result<SyncReport> {
        let adapter = self.resolver.adapter(game).ok_or_else(|| {
            TcgSyncError::InvalidArgument(format!("no card API registered for {}", game))
        })?;

        let set_codes: Vec<String> = match set {
            Some(code) => vec![code.trim().to_string()],
            None => self
                .resolver
                .sets(game)?
                .into_iter()
                .map(|s| s.code)
                .collect(),
        };

        let mut report = SyncReport::default();
        for code in &set_codes {
            tracing::info!(%game, set = %code, "syncing set");
            let stream = match adapter.fetch_cards_in_set(code) {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!(%game, set = %code, error = %e, "could not list set");
                    continue;
                }
            };
            for record in stream {
                let card = match record
                    .map_err(|e| e.to_string())
                    .and_then(|raw| CardFactory::create_for(game, &raw).map_err(|e| e.to_string()))
                {
                    Ok(card) => card,
                    Err(reason) => {
                        tracing::warn!(%game, set = %code, %reason, "skipping bad record");
                        report.errored += 1;
                        continue;
                    }
                };
                self.sync_card(card, options, &mut report);
            }
        }

        tracing::info!(
            %game,
            saved = report.saved,
            skipped = report.skipped,
            errored = report.errored,
            image_skipped = report.image_skipped,
            image_errored = report.image_errored,
            "sync finished"
        );
        Ok(report)
    }

    fn sync_card(&self, mut card: Card, options: SyncOptions, report: &mut SyncReport) {
        let key = card.natural_key();
        let existing = match self.resolver.repository().find_by_set_and_number(
            key.game,
            &key.set_code,
            &key.number,
        ) {
            Ok(existing) => existing,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "lookup failed");
                report.errored += 1;
                return;
            }
        };

        match existing {
            Some(_) if !options.update_existing => report.skipped += 1,
            existing => {
                if let Some(stored) = existing {
                    card.id = stored.id;
                }
                match self.resolver.persist(card.clone()) {
                    Ok(stored) => {
                        card = stored;
                        report.saved += 1;
                    }
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "save failed");
                        report.errored += 1;
                        return;
                    }
                }
            }
        }

        let (Some(images), Some(url)) = (self.images, card.image_url.as_deref()) else {
            return;
        };
        if options.skip_existing_images && images.has_image(&card) {
            report.image_skipped += 1;
            return;
        }
        if let Err(e) = images.store(&card, url) {
            tracing::warn!(key = %key, error = %e, "image download failed");
            report.image_errored += 1;
        }
    }
}
