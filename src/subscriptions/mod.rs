//! Subscription list stored as a CSV file
//!
//! The first row of the file is the header and fixes the column order for
//! every record. The whole file is read on load and rewritten on save;
//! nothing is appended in place.

mod record;
mod store;

use std::path::PathBuf;

use thiserror::Error;

pub use record::{SubscriptionRecord, SubscriptionTable};
pub use store::SubscriptionStore;

/// Errors that can occur when loading, changing or saving subscriptions
#[derive(Debug, Error)]
pub enum SubscriptionError {
    /// Backing file missing, unreadable or unwritable
    #[error("Subscription file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backing file is not well-formed CSV, or a row has the wrong width
    #[error("Malformed subscription file {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Backing file has no header row
    #[error("Subscription file {path} has no header row")]
    MissingHeader { path: PathBuf },

    /// A record or header does not fit the table's schema
    #[error("Row {row} does not match the subscription header: {reason}")]
    Schema { row: usize, reason: String },
}
