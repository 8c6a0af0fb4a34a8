//! Dining hall location registry
//!
//! Maps a human-readable location key (e.g. `"Stwest"`) to the opaque
//! identifiers the menu API needs. The registry is fixed at startup: either
//! the built-in table of dining halls or one loaded from a JSON file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Site id shared by every dining hall on the main campus
const CAMPUS_SITE_ID: &str = "5751fd2b90975b60e048929a";

/// Built-in dining halls as `(key, location_id, site_id)`
static DINING_HALLS: [(&str, &str, &str); 3] = [
    ("Stwest", "586d05e4ee596f6e6c04b528", CAMPUS_SITE_ID),
    ("Steast", "586d05e4ee596f6e6c04b527", CAMPUS_SITE_ID),
    ("IV", "586d17503191a27120e60dec", CAMPUS_SITE_ID),
];

/// Errors that can occur when building or loading a registry
#[derive(Debug, Error)]
pub enum LocationError {
    /// Key is empty or contains characters unsafe for a cache file name
    #[error("Invalid location key: '{0}'. Keys may only use letters, digits, '-' and '_'")]
    InvalidKey(String),

    /// Registry file could not be read
    #[error("Failed to read location registry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Registry JSON is malformed
    #[error("Failed to parse location registry: {0}")]
    Parse(#[from] serde_json::Error),
}

/// API identifiers for one dining location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub location_id: String,
    pub site_id: String,
}

impl Location {
    pub fn new(location_id: impl Into<String>, site_id: impl Into<String>) -> Self {
        Self {
            location_id: location_id.into(),
            site_id: site_id.into(),
        }
    }

    /// Query parameters this location contributes to a menu request
    pub fn query_pairs(&self) -> [(&'static str, &str); 2] {
        [
            ("location_id", self.location_id.as_str()),
            ("site_id", self.site_id.as_str()),
        ]
    }
}

/// Immutable map from location key to [`Location`]
///
/// Keys are kept sorted so listings are stable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, Location>")]
pub struct LocationRegistry {
    locations: BTreeMap<String, Location>,
}

impl LocationRegistry {
    /// Builds a registry, rejecting keys that are not safe to use in a file name
    pub fn new<I, K>(locations: I) -> Result<Self, LocationError>
    where
        I: IntoIterator<Item = (K, Location)>,
        K: Into<String>,
    {
        let locations = locations
            .into_iter()
            .map(|(key, location)| {
                let key = key.into();
                if is_valid_key(&key) {
                    Ok((key, location))
                } else {
                    Err(LocationError::InvalidKey(key))
                }
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(Self { locations })
    }

    /// Parses a registry from JSON of the form
    /// `{"Stwest": {"location_id": "...", "site_id": "..."}}`
    pub fn from_json_str(json: &str) -> Result<Self, LocationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, LocationError> {
        let contents = fs::read_to_string(path).map_err(|source| LocationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn get(&self, key: &str) -> Option<&Location> {
        self.locations.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.locations.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.locations.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Location)> {
        self.locations.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl Default for LocationRegistry {
    fn default() -> Self {
        let locations = DINING_HALLS
            .iter()
            .map(|(key, location_id, site_id)| (key.to_string(), Location::new(*location_id, *site_id)))
            .collect();
        Self { locations }
    }
}

impl TryFrom<BTreeMap<String, Location>> for LocationRegistry {
    type Error = LocationError;

    fn try_from(locations: BTreeMap<String, Location>) -> Result<Self, Self::Error> {
        Self::new(locations)
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
