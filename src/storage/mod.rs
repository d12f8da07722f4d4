//! Key/value storage backends for client-side persistence.
//!
//! DESIGN
//! ======
//! Two scopes mirror what a browser offers: [`FileStorage`] survives process
//! restarts (the "remember me" scope) and [`MemoryStorage`] lives only as long
//! as the process (the session scope). Both sit behind [`KeyValueStorage`] so
//! the token store never cares which one it is talking to.
//!
//! ERROR HANDLING
//! ==============
//! Reads never fail: a missing key and an unreadable entry both come back as
//! `None`. Writes report I/O failures so callers can decide how loud to be.

pub mod tokens;

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// The durable store is expected to hold a handful of short strings.
pub const MAX_STORAGE_BYTES: u64 = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] io::Error),
    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("storage file too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },
}

/// A string key/value store shared across tasks.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    ///
    /// Returns a [`StorageError`] if the value could not be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the removal could not be persisted.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// =============================================================================
// MEMORY STORAGE
// =============================================================================

/// Process-lifetime storage; the session scope.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

// =============================================================================
// FILE STORAGE
// =============================================================================

/// JSON-file-backed storage; the durable scope.
///
/// The whole map is cached in memory and rewritten on every mutation through
/// a temp file + rename so a crash never leaves a half-written file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A file that is not a JSON object of strings, or is larger than
    /// [`MAX_STORAGE_BYTES`], is renamed to `<name>.corrupt` and the store
    /// starts empty, so a damaged file can never lock the user out.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if an existing file cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match load_entries(&path) {
            Ok(entries) => entries,
            Err(e @ (StorageError::Corrupt(_) | StorageError::TooLarge { .. })) => {
                let aside = corrupt_path(&path);
                tracing::warn!(error = %e, path = %path.display(), "unreadable storage file; starting empty");
                if let Err(e) = fs::rename(&path, &aside) {
                    tracing::warn!(error = %e, path = %aside.display(), "could not set storage file aside");
                }
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        write_private(&tmp, &raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// The file holds bearer credentials: owner read/write only on unix.
fn write_private(path: &Path, raw: &[u8]) -> io::Result<()> {
    // A leftover temp file would keep its old permissions.
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(raw)?;
    file.sync_all()
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".corrupt");
    PathBuf::from(name)
}

fn load_entries(path: &Path) -> Result<BTreeMap<String, String>, StorageError> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(e.into()),
    };
    if meta.len() > MAX_STORAGE_BYTES {
        return Err(StorageError::TooLarge { size: meta.len(), max: MAX_STORAGE_BYTES });
    }
    let raw = fs::read(path)?;
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(BTreeMap::new());
    }
    Ok(serde_json::from_slice(&raw)?)
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.get(key).is_some_and(|v| v == value) {
            return Ok(());
        }
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&entries)
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
