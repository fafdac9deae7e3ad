//! Persistent key-value store: trait seam + file-backed and in-memory impls.
//!
//! Values are opaque serialized blobs (one envelope per content stream).
//! Store failures never propagate: a broken read behaves like an absent
//! key and a failed write leaves the previous value in place. The file
//! backend assumes a single writer process; concurrent multi-process
//! writers are out of scope.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Trait object used by the sync cache (and tests).
pub trait KvStore: Send + Sync {
    /// Read the value under `key`, or `None` when absent/unreadable.
    fn get(&self, key: &str) -> Option<String>;
    /// Write `value` under `key` (best effort).
    fn set(&self, key: &str, value: &str);
    /// Drop `key` if present (best effort).
    fn remove(&self, key: &str);
}

/// Convenient alias used by callers.
pub type SharedStore = Arc<dyn KvStore>;

// ------------------------------------------------------------
// File-backed store
// ------------------------------------------------------------

/// One file per key under a data directory; atomic writes via tmp+rename.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let _ = fs::create_dir_all(&dir); // best-effort
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }

    fn write_atomic(path: &Path, value: &str) -> std::io::Result<()> {
        let tmp = path.with_extension("json.tmp");
        let mut f = fs::File::create(&tmp)?;
        f.write_all(value.as_bytes())?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        let path = self.path_for(key);
        if let Err(e) = Self::write_atomic(&path, value) {
            tracing::warn!(error = %e, path = %path.display(), "store write failed");
        }
    }

    fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.path_for(key));
    }
}

// ------------------------------------------------------------
// In-memory store
// ------------------------------------------------------------

/// Mutex-guarded map; used by tests and cache-only/offline runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().expect("store mutex poisoned").get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.inner.lock().expect("store mutex poisoned").remove(key);
    }
}

/// Map a stream key to a safe file stem (keys are fixed constants, but the
/// store does not rely on that).
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
