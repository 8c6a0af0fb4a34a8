//! Cache manager for persisting menu responses to disk
//!
//! Provides a `CacheManager` that stores raw response bodies as JSON files,
//! one per [`CacheKey`]. Entries are write-once: a second write for a key
//! that already has a file leaves the existing file alone.

use directories::ProjectDirs;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::CacheKey;

/// Directory used when no XDG cache directory can be determined
const FALLBACK_CACHE_DIR: &str = "json";

/// Manages reading and writing cached menus on disk
///
/// The cache manager stores data as JSON files in an XDG-compliant cache directory
/// (`~/.cache/huskymeal/menus/` on Linux). File contents are exactly the bytes
/// returned by the remote API, so re-reads are byte-identical.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl CacheManager {
    /// Creates a new CacheManager using XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        Self::default_dir().map(Self::with_dir)
    }

    /// Creates a new CacheManager with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// The XDG cache directory for menus, or `json/` relative to the working
    /// directory when there is no home directory
    pub fn default_dir() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "huskymeal")?;
        Some(project_dirs.cache_dir().join("menus"))
    }

    /// Same as [`CacheManager::default_dir`] but never fails
    pub fn default_dir_or_fallback() -> PathBuf {
        Self::default_dir().unwrap_or_else(|| PathBuf::from(FALLBACK_CACHE_DIR))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to the cache file for the given key
    pub fn cache_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key.file_stem()))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }

    /// Whether an entry exists for `key`
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.cache_path(key).is_file()
    }

    /// Reads the raw bytes stored for `key`
    ///
    /// # Returns
    /// * `Ok(Some(bytes))` if the entry exists
    /// * `Ok(None)` if there is no entry for the key
    /// * `Err` if the file exists but cannot be read
    pub fn read_raw(&self, key: &CacheKey) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.cache_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Stores `body` for `key` unless an entry already exists
    ///
    /// The body is written to a temporary file in the cache directory and
    /// then linked into place, so readers never observe a partially written
    /// entry.
    ///
    /// # Returns
    /// * `Ok(true)` if the entry was written
    /// * `Ok(false)` if an entry already existed and was left untouched
    /// * `Err` if directory creation or file writing fails
    pub fn write_once(&self, key: &CacheKey, body: &[u8]) -> io::Result<bool> {
        self.ensure_dir()?;

        let path = self.cache_path(key);
        if path.exists() {
            return Ok(false);
        }

        let mut tmp = NamedTempFile::new_in(&self.cache_dir)?;
        tmp.write_all(body)?;
        tmp.as_file().sync_all()?;

        match tmp.persist_noclobber(&path) {
            Ok(_) => Ok(true),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.error),
        }
    }
}
