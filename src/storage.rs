//! Client-local key/value storage
//!
//! This module provides:
//! - The `KeyValueStore` seam every stateful component persists through
//! - A file-backed store for native platforms (one JSON file per key)
//! - A `localStorage` store for the browser
//! - An in-memory store for tests and as a fallback

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[cfg(not(target_arch = "wasm32"))]
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable string storage keyed by name. Reads never fail: a missing or
/// unreadable entry is `None`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Vec<String>;
}

pub type SharedStore = Arc<dyn KeyValueStore>;

// ============================================
// In-memory backend
// ============================================

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().ok()?;
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }
}

// ============================================
// File backend (native platforms)
// ============================================

/// Longest file or directory name the file backend writes.
#[cfg(not(target_arch = "wasm32"))]
const MAX_NAME_LEN: usize = 200;

/// Stores each key as `<root>/<encoded key>.json`. Encoded keys longer than
/// [`MAX_NAME_LEN`] are split across nested directories.
#[cfg(not(target_arch = "wasm32"))]
pub struct FileStore {
    root: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let encoded = encode_key(key);
        let mut path = self.root.clone();
        let mut rest = encoded.as_str();
        while rest.len() > MAX_NAME_LEN {
            let (head, tail) = rest.split_at(MAX_NAME_LEN);
            path.push(head);
            rest = tail;
        }
        path.push(format!("{rest}.json"));
        path
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        collect_keys(&self.root, "", &mut keys);
        keys
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn collect_keys(dir: &Path, prefix: &str, keys: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_dir() {
            collect_keys(&path, &format!("{prefix}{name}"), keys);
        } else if let Some(stem) = name.strip_suffix(".json")
            && let Some(key) = decode_key(&format!("{prefix}{stem}"))
        {
            keys.push(key);
        }
    }
}

/// Default storage directory for native builds.
#[cfg(not(target_arch = "wasm32"))]
pub fn default_storage_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        return data_dir.join("chatterbox").join("store");
    }

    PathBuf::from("cache").join("store")
}

/// Picks the platform store. `dir` overrides the native location.
#[cfg(not(target_arch = "wasm32"))]
pub fn default_store(dir: Option<&Path>) -> SharedStore {
    let root = dir
        .map(Path::to_path_buf)
        .unwrap_or_else(default_storage_dir);
    tracing::debug!(root = %root.display(), "using file store");
    Arc::new(FileStore::new(root))
}

// ============================================
// Browser backend (web)
// ============================================

const LOCAL_STORAGE_PREFIX: &str = "chatterbox:";

/// Keeps entries in `window.localStorage` under a `chatterbox:` prefix.
#[cfg(target_arch = "wasm32")]
#[derive(Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    /// `None` when the page has no usable `localStorage` (private mode,
    /// sandboxed iframes).
    pub fn open() -> Option<Self> {
        Self::storage().ok().map(|_| Self)
    }

    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".into()))?
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| StorageError::Unavailable("localStorage is disabled".into()))
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()
            .ok()?
            .get_item(&namespaced_key(key))
            .ok()
            .flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(&namespaced_key(key), value)
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        Self::storage()?
            .remove_item(&namespaced_key(key))
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }

    fn keys(&self) -> Vec<String> {
        let Ok(storage) = Self::storage() else {
            return Vec::new();
        };
        let len = storage.length().unwrap_or(0);
        (0..len)
            .filter_map(|index| storage.key(index).ok().flatten())
            .filter_map(|raw| strip_namespace(&raw).map(str::to_string))
            .collect()
    }
}

#[cfg(target_arch = "wasm32")]
pub fn default_store(_dir: Option<&std::path::Path>) -> SharedStore {
    match LocalStorageStore::open() {
        Some(store) => Arc::new(store),
        None => {
            tracing::warn!("localStorage unavailable, state will not survive a reload");
            Arc::new(MemoryStore::new())
        }
    }
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn namespaced_key(key: &str) -> String {
    format!("{LOCAL_STORAGE_PREFIX}{key}")
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn strip_namespace(raw: &str) -> Option<&str> {
    raw.strip_prefix(LOCAL_STORAGE_PREFIX)
}

// ============================================
// Key encoding
// ============================================

/// Everything except lowercase ASCII letters, digits, `-` and `_` is escaped.
/// Uppercase letters are escaped too so that keys differing only in case stay
/// distinct on case-insensitive filesystems.
const KEY_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .add(b'A')
    .add(b'B')
    .add(b'C')
    .add(b'D')
    .add(b'E')
    .add(b'F')
    .add(b'G')
    .add(b'H')
    .add(b'I')
    .add(b'J')
    .add(b'K')
    .add(b'L')
    .add(b'M')
    .add(b'N')
    .add(b'O')
    .add(b'P')
    .add(b'Q')
    .add(b'R')
    .add(b'S')
    .add(b'T')
    .add(b'U')
    .add(b'V')
    .add(b'W')
    .add(b'X')
    .add(b'Y')
    .add(b'Z');

/// Encodes a storage key as a filesystem-safe name. Distinct keys always
/// produce distinct names.
pub fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, KEY_ESCAPES).to_string()
}

/// Inverse of [`encode_key`]. `None` for names it could not have produced.
pub fn decode_key(encoded: &str) -> Option<String> {
    let decoded = percent_decode_str(encoded).decode_utf8().ok()?;
    (encode_key(&decoded) == encoded).then(|| decoded.into_owned())
}
