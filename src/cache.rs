//! Key/value cache with per-entry TTL.
//!
//! The resolver only talks to the [`CacheStore`] port. Two stores ship with
//! the crate: [`MemoryCache`] for in-process use and tests, and
//! [`FileCache`], which keeps one gzip-compressed JSON envelope per key in
//! the cache directory.

use std::collections::HashMap;
use std::fs;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config;
use crate::error::{Result, TcgSyncError};

/// Cache port used by the resolver.
pub trait CacheStore: Send + Sync {
    /// Return the live value for `key`, or `None` when absent or expired.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()>;

    fn delete(&self, key: &str) -> Result<()>;
}

fn expiry(ttl: Duration) -> DateTime<Utc> {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
    Utc::now().checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    expires_at: DateTime<Utc>,
    value: Value,
}

impl Envelope {
    fn is_live(&self) -> bool {
        self.expires_at > Utc::now()
    }
}

// ---------------------------------------------------------------------------
// MemoryCache
// ---------------------------------------------------------------------------

/// In-process cache backed by a mutex-guarded map.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Envelope>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().values().filter(|e| e.is_live()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Envelope>> {
        // a panic while holding the lock leaves the map itself intact
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.is_live() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        self.lock().insert(
            key.to_string(),
            Envelope {
                expires_at: expiry(ttl),
                value: value.clone(),
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileCache
// ---------------------------------------------------------------------------

/// Directory-backed cache, one `<key>.json.gz` file per entry.
///
/// Writes go to a temp file that is renamed into place, so readers never
/// see a truncated entry. Entries that fail to decode are deleted and
/// reported as a miss.
pub struct FileCache {
    /// Directory where cache entries are stored.
    pub cache_dir: PathBuf,
}

impl FileCache {
    /// Create a file cache, creating the directory if needed.
    ///
    /// If `cache_dir` is `None`, uses the platform-appropriate default cache directory.
    pub fn new(cache_dir: Option<PathBuf>) -> Result<Self> {
        let dir = cache_dir.unwrap_or_else(config::default_cache_dir);
        fs::create_dir_all(&dir)?;
        Ok(Self { cache_dir: dir })
    }

    /// Map a cache key onto a file name. `:` becomes `_`; every other byte
    /// outside `[A-Za-z0-9.-]` (including `_` itself) is percent-encoded, so
    /// distinct keys never share a file.
    fn entry_path(&self, key: &str) -> PathBuf {
        let mut safe = String::with_capacity(key.len());
        for c in key.chars() {
            match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '.' => safe.push(c),
                ':' => safe.push('_'),
                _ => {
                    let mut buf = [0u8; 4];
                    for byte in c.encode_utf8(&mut buf).bytes() {
                        safe.push_str(&format!("%{:02X}", byte));
                    }
                }
            }
        }
        self.cache_dir.join(format!("{}.json.gz", safe))
    }

    fn read_envelope(path: &Path) -> Result<Envelope> {
        let file = fs::File::open(path)?;
        let mut decoder = GzDecoder::new(BufReader::new(file));
        let mut contents = String::new();
        decoder.read_to_string(&mut contents)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Remove all cached entries and recreate the cache directory.
    pub fn clear(&self) -> Result<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)?;
            fs::create_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }
}

impl CacheStore for FileCache {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }

        match Self::read_envelope(&path) {
            Ok(envelope) if envelope.is_live() => Ok(Some(envelope.value)),
            Ok(_) => {
                let _ = fs::remove_file(&path);
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt cache entry; removing");
                let _ = fs::remove_file(&path);
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        let envelope = Envelope {
            expires_at: expiry(ttl),
            value: value.clone(),
        };

        // unique temp file per writer; dropped (and removed) on any error
        let tmp = tempfile::NamedTempFile::new_in(&self.cache_dir)?;
        let mut encoder = GzEncoder::new(tmp, Compression::default());
        encoder.write_all(serde_json::to_string(&envelope)?.as_bytes())?;
        let tmp = encoder.finish()?;
        tmp.persist(self.entry_path(key)).map_err(|e| e.error)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TcgSyncError::Io(e)),
        }
    }
}
