//! CSV-backed subscription store with whole-file reload and atomic rewrite

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{SubscriptionError, SubscriptionRecord, SubscriptionTable};

/// A subscription table backed by a CSV file
///
/// The in-memory table is guarded by a lock: `reload`, `write` and the
/// mutating methods take it exclusively, so only one of them runs at a time
/// and readers never see a table mid-change. Changes stay in memory until
/// [`SubscriptionStore::write`] is called.
#[derive(Debug)]
pub struct SubscriptionStore {
    path: PathBuf,
    table: RwLock<SubscriptionTable>,
}

impl SubscriptionStore {
    /// Opens an existing subscription file and loads it
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SubscriptionError> {
        let path = path.into();
        let table = read_table(&path)?;
        debug!(path = %path.display(), records = table.len(), "Loaded subscriptions");
        Ok(Self {
            path,
            table: RwLock::new(table),
        })
    }

    /// Creates a new, empty subscription file with the given columns
    ///
    /// Fails with [`SubscriptionError::Io`] (`AlreadyExists`) if `path` already
    /// exists; the existing file is left untouched.
    pub fn create<I, S>(path: impl Into<PathBuf>, header: I) -> Result<Self, SubscriptionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self {
            path: path.into(),
            table: RwLock::new(SubscriptionTable::new(header)?),
        };
        store.persist(&store.write_lock(), false)?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the in-memory table with the file's current contents
    ///
    /// On failure the previous table is kept as it was.
    pub fn reload(&self) -> Result<(), SubscriptionError> {
        let mut table = self.write_lock();
        *table = read_table(&self.path)?;
        debug!(path = %self.path.display(), records = table.len(), "Reloaded subscriptions");
        Ok(())
    }

    /// Rewrites the backing file from the in-memory table
    ///
    /// The table is validated first, then written to a temporary file next
    /// to the target and renamed over it, so the file on disk is always
    /// either the old or the new contents.
    pub fn write(&self) -> Result<(), SubscriptionError> {
        self.persist(&self.write_lock(), true)
    }

    /// Validates `table` and writes it through a temporary file, replacing
    /// an existing backing file only when `replace` is set
    fn persist(&self, table: &SubscriptionTable, replace: bool) -> Result<(), SubscriptionError> {
        table.validate()?;

        let io_error = |source: std::io::Error| SubscriptionError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_error)?;

        table
            .to_writer(&mut tmp)
            .map_err(|source| SubscriptionError::Csv {
                path: self.path.clone(),
                source,
            })?;
        tmp.as_file().sync_all().map_err(io_error)?;
        if replace {
            tmp.persist(&self.path).map_err(|e| io_error(e.error))?;
        } else {
            tmp.persist_noclobber(&self.path).map_err(|e| io_error(e.error))?;
        }

        info!(path = %self.path.display(), records = table.len(), "Wrote subscriptions");
        Ok(())
    }

    pub fn header(&self) -> Vec<String> {
        self.read_lock().header().to_vec()
    }

    pub fn records(&self) -> Vec<SubscriptionRecord> {
        self.read_lock().records().to_vec()
    }

    /// Copy of the whole table
    pub fn snapshot(&self) -> SubscriptionTable {
        self.read_lock().clone()
    }

    pub fn len(&self) -> usize {
        self.read_lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_lock().is_empty()
    }

    /// Adds a record in memory; see [`SubscriptionTable::push`]
    pub fn add(&self, record: SubscriptionRecord) -> Result<(), SubscriptionError> {
        self.write_lock().push(record)
    }

    /// Removes matching records in memory and returns how many were removed
    pub fn remove_where(&self, column: &str, value: &str) -> usize {
        self.write_lock().remove_where(column, value)
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, SubscriptionTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, SubscriptionTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_table(path: &Path) -> Result<SubscriptionTable, SubscriptionError> {
    let file = File::open(path).map_err(|source| SubscriptionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    SubscriptionTable::from_reader(BufReader::new(file), path)
}
