//! Husky Meal Finder library
//!
//! Dining hall menus fetched from the dineoncampus API and cached on disk,
//! plus the CSV-backed subscription list. The CLI module is exposed for use
//! in integration tests.

pub mod cache;
pub mod cli;
pub mod menu;
pub mod subscriptions;

pub use menu::{FetcherConfig, MenuDocument, MenuError, MenuFetcher};
pub use subscriptions::{SubscriptionError, SubscriptionRecord, SubscriptionStore};
