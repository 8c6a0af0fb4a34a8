//! Dining hall menus
//!
//! This module resolves a location key and date to that day's menu. Menus
//! come from the dineoncampus menu API and are cached on disk by
//! [`MenuFetcher`]; the set of known locations lives in a
//! [`LocationRegistry`].

mod error;
pub mod fetcher;
pub mod locations;

pub use error::{FailureKind, MenuError};
pub use fetcher::{FetcherConfig, MenuFetcher, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use locations::{Location, LocationError, LocationRegistry};

/// One day's menu for one location, exactly as the API returned it
///
/// The content is not validated beyond being well-formed JSON. A day with no
/// published menu is still a document (often a near-empty one).
pub type MenuDocument = serde_json::Value;
