//! Local storage
//!
//! A string key/value map shared by the controller, playlist and settings,
//! mirroring browser `localStorage`. When opened from a file, every write is
//! flushed to that file as a JSON object.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::Result;

pub const PLAYLIST_KEY: &str = "playlist";
pub const LAST_POSITION_KEY: &str = "lastPosition";
pub const DEFAULT_VOLUME_KEY: &str = "defaultVolume";
pub const DARK_MODE_KEY: &str = "darkMode";
pub const SHOW_LYRICS_KEY: &str = "showLyrics";
pub const LYRICS_FONT_SIZE_KEY: &str = "lyricsFontSize";
pub const AUTO_SCROLL_KEY: &str = "autoScroll";

#[derive(Debug, Default)]
struct StoreInner {
    entries: BTreeMap<String, String>,
    path: Option<PathBuf>,
}

/// Cloneable handle to one key/value store
#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl LocalStore {
    /// Store that lives only in memory
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a file-backed store
    ///
    /// A missing file yields an empty store. A malformed file is logged and
    /// treated as empty; it is overwritten on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Ignoring malformed local store {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("Opened local store {} ({} keys)", path.display(), entries.len());

        Ok(Self {
            inner: Arc::new(Mutex::new(StoreInner {
                entries,
                path: Some(path),
            })),
        })
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    /// Parse a stored value; unparsable values read as absent
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key)?.parse().ok()
    }

    /// Decode a JSON value; malformed values are logged and read as absent
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring malformed {} in local store: {}", key, e);
                None
            }
        }
    }

    pub fn set(&self, key: &str, value: impl Into<String>) {
        let mut inner = self.lock();
        inner.entries.insert(key.to_string(), value.into());
        persist(&inner);
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let encoded = serde_json::to_string(value)?;
        self.set(key, encoded);
        Ok(())
    }

    pub fn remove(&self, key: &str) {
        let mut inner = self.lock();
        if inner.entries.remove(key).is_some() {
            persist(&inner);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        persist(&inner);
    }

    /// Write the store to its backing file, if any
    pub fn flush(&self) -> Result<()> {
        let inner = self.lock();
        match &inner.path {
            Some(path) => write_entries(path, &inner.entries),
            None => Ok(()),
        }
    }
}

fn persist(inner: &StoreInner) {
    if let Some(path) = &inner.path {
        if let Err(e) = write_entries(path, &inner.entries) {
            warn!("Failed to persist local store {}: {}", path.display(), e);
        }
    }
}

/// Replace the file through a temporary sibling so readers never see a torn write
fn write_entries(path: &Path, entries: &BTreeMap<String, String>) -> Result<()> {
    let encoded = serde_json::to_vec_pretty(entries)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, encoded)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Lyrics panel font size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LyricsFontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl LyricsFontSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            LyricsFontSize::Small => "small",
            LyricsFontSize::Medium => "medium",
            LyricsFontSize::Large => "large",
        }
    }
}

impl FromStr for LyricsFontSize {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "small" => Ok(LyricsFontSize::Small),
            "medium" => Ok(LyricsFontSize::Medium),
            "large" => Ok(LyricsFontSize::Large),
            other => Err(format!("unknown lyrics font size: {}", other)),
        }
    }
}

/// Settings page values
#[derive(Debug, Clone, PartialEq)]
pub struct UserPreferences {
    /// Initial volume in `[0, 1]`
    pub default_volume: f64,
    pub dark_mode: bool,
    pub show_lyrics: bool,
    pub lyrics_font_size: LyricsFontSize,
    pub auto_scroll: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            default_volume: 1.0,
            dark_mode: false,
            show_lyrics: true,
            lyrics_font_size: LyricsFontSize::Medium,
            auto_scroll: true,
        }
    }
}

impl UserPreferences {
    /// Load from the store; absent or unparsable keys keep their defaults
    pub fn load(store: &LocalStore) -> Self {
        let defaults = Self::default();
        Self {
            default_volume: store
                .get_parsed::<f64>(DEFAULT_VOLUME_KEY)
                .filter(|v| v.is_finite())
                .map(|v| v.clamp(0.0, 1.0))
                .unwrap_or(defaults.default_volume),
            dark_mode: store.get_parsed(DARK_MODE_KEY).unwrap_or(defaults.dark_mode),
            show_lyrics: store.get_parsed(SHOW_LYRICS_KEY).unwrap_or(defaults.show_lyrics),
            lyrics_font_size: store
                .get_parsed(LYRICS_FONT_SIZE_KEY)
                .unwrap_or(defaults.lyrics_font_size),
            auto_scroll: store.get_parsed(AUTO_SCROLL_KEY).unwrap_or(defaults.auto_scroll),
        }
    }

    pub fn save(&self, store: &LocalStore) {
        store.set(DEFAULT_VOLUME_KEY, self.default_volume.to_string());
        store.set(DARK_MODE_KEY, self.dark_mode.to_string());
        store.set(SHOW_LYRICS_KEY, self.show_lyrics.to_string());
        store.set(LYRICS_FONT_SIZE_KEY, self.lyrics_font_size.as_str());
        store.set(AUTO_SCROLL_KEY, self.auto_scroll.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clones_share_entries() {
        let store = LocalStore::in_memory();
        let other = store.clone();
        store.set("k", "v");
        assert_eq!(other.get("k").as_deref(), Some("v"));
        other.remove("k");
        assert!(!store.contains("k"));
    }

    #[test]
    fn test_file_backed_store_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("local-storage.json");

        let store = LocalStore::open(&path).unwrap();
        store.set(LAST_POSITION_KEY, "42.5");
        drop(store);

        let reopened = LocalStore::open(&path).unwrap();
        assert_eq!(reopened.get_parsed::<f64>(LAST_POSITION_KEY), Some(42.5));
    }

    #[test]
    fn test_malformed_file_reads_as_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("local-storage.json");
        fs::write(&path, "not json").unwrap();

        let store = LocalStore::open(&path).unwrap();
        assert!(store.get(PLAYLIST_KEY).is_none());
    }

    #[test]
    fn test_preferences_defaults_and_round_trip() {
        let store = LocalStore::in_memory();
        assert_eq!(UserPreferences::load(&store), UserPreferences::default());

        let prefs = UserPreferences {
            default_volume: 0.4,
            dark_mode: true,
            show_lyrics: false,
            lyrics_font_size: LyricsFontSize::Large,
            auto_scroll: false,
        };
        prefs.save(&store);
        assert_eq!(store.get(LYRICS_FONT_SIZE_KEY).as_deref(), Some("large"));
        assert_eq!(UserPreferences::load(&store), prefs);
    }

    #[test]
    fn test_preferences_ignore_bad_values() {
        let store = LocalStore::in_memory();
        store.set(DEFAULT_VOLUME_KEY, "7");
        store.set(DARK_MODE_KEY, "yes");
        store.set(LYRICS_FONT_SIZE_KEY, "huge");

        let prefs = UserPreferences::load(&store);
        assert_eq!(prefs.default_volume, 1.0);
        assert!(!prefs.dark_mode);
        assert_eq!(prefs.lyrics_font_size, LyricsFontSize::Medium);
    }
}
