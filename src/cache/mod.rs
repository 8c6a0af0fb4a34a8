//! Cache module for storing menu API responses to disk
//!
//! Menus are stored one file per `(date, location)` pair and are never
//! expired: once a file exists for a key it is served from disk forever.
//! Deleting the file by hand is the only way to force a refetch.
//!
//! The module also provides [`KeyLocks`], a per-key async lock table used to
//! make sure only one fetch for a given key is in flight at a time.

mod key;
mod locks;
mod manager;

pub use key::CacheKey;
pub use locks::{KeyGuard, KeyLocks};
pub use manager::CacheManager;
