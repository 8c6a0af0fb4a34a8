//! Menu fetcher backed by the on-disk cache
//!
//! Resolves a `(location, date)` request to a menu document. The disk cache
//! is consulted first; only on a miss is the remote menu API called, and a
//! successful response is stored verbatim so later requests never hit the
//! network again.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};
use url::Url;

use super::{Location, LocationRegistry, MenuDocument, MenuError};
use crate::cache::{CacheKey, CacheManager, KeyLocks};

/// Menu endpoint of the dining API
pub const DEFAULT_BASE_URL: &str = "https://new.dineoncampus.com/v1/location/menu.json";

/// How long a single menu request may take before it is abandoned
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Platform code the API expects from web clients
const PLATFORM: &str = "0";

/// Everything the fetcher needs, passed in explicitly at construction
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Menu endpoint, without query string
    pub base_url: String,
    /// Timeout for each network request
    pub timeout: Duration,
    /// Directory holding cached menu files
    pub cache_dir: PathBuf,
    /// Known dining locations
    pub registry: LocationRegistry,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            cache_dir: CacheManager::default_dir_or_fallback(),
            registry: LocationRegistry::default(),
        }
    }
}

impl FetcherConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    pub fn with_registry(mut self, registry: LocationRegistry) -> Self {
        self.registry = registry;
        self
    }
}

/// Loads menus from the disk cache, falling back to the menu API
///
/// Cloning is cheap; clones share the HTTP client, the registry and the
/// per-key lock table, so concurrent requests for the same key from any clone
/// result in a single network call.
#[derive(Debug, Clone)]
pub struct MenuFetcher {
    http_client: Client,
    base_url: Url,
    cache: CacheManager,
    registry: Arc<LocationRegistry>,
    locks: KeyLocks,
}

impl MenuFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, MenuError> {
        let base_url = Url::parse(&config.base_url).map_err(|source| MenuError::InvalidUrl {
            url: config.base_url.clone(),
            source,
        })?;

        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MenuError::Client)?;

        Ok(Self {
            http_client,
            base_url,
            cache: CacheManager::with_dir(config.cache_dir),
            registry: Arc::new(config.registry),
            locks: KeyLocks::new(),
        })
    }

    pub fn registry(&self) -> &LocationRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Full request URL for a location's menu on `date`
    pub fn menu_url(&self, location_key: &str, date: NaiveDate) -> Result<Url, MenuError> {
        let location = self.location(location_key)?;
        Ok(self.build_url(location, date))
    }

    /// Loads today's menu for `location_key`
    pub async fn load_menu_today(&self, location_key: &str) -> Result<MenuDocument, MenuError> {
        self.load_menu(location_key, None).await
    }

    /// Loads the menu for `location_key` on `date` (today if `None`)
    ///
    /// # Returns
    /// * `Ok(MenuDocument)` from the cache, or freshly fetched and now cached
    /// * `Err(MenuError)` if the location is unknown, the cached entry is
    ///   unreadable, or the API could not be reached or answered non-200
    ///
    /// # Behavior
    /// - A cached entry is trusted forever; no network call is made
    /// - On a miss, the first caller for a key fetches while later callers
    ///   for the same key wait and then read the freshly written entry
    /// - Failed fetches never write to the cache
    /// - An empty menu from the API is a success and is cached like any other
    pub async fn load_menu(
        &self,
        location_key: &str,
        date: Option<NaiveDate>,
    ) -> Result<MenuDocument, MenuError> {
        let date = date.unwrap_or_else(today);
        let location = self.location(location_key)?;
        let key = CacheKey::new(date, location_key);

        if let Some(menu) = self.read_cached(&key)? {
            return Ok(menu);
        }

        let _guard = self.locks.lock(&key).await;

        // Another task may have stored the entry while we waited for the lock
        if let Some(menu) = self.read_cached(&key)? {
            return Ok(menu);
        }

        let url = self.build_url(location, date);
        info!(location = location_key, date = %date, "Fetching menu from API");
        let body = self.fetch(&url).await?;

        let menu: MenuDocument =
            serde_json::from_slice(&body).map_err(|source| MenuError::InvalidBody {
                url: url.to_string(),
                source,
            })?;

        match self.cache.write_once(&key, &body) {
            Ok(true) => info!(path = %self.cache.cache_path(&key).display(), "Cached menu"),
            Ok(false) => debug!(%key, "Menu already cached, keeping existing entry"),
            Err(e) => warn!(%key, error = %e, "Failed to cache menu"),
        }

        Ok(menu)
    }

    fn location(&self, location_key: &str) -> Result<&Location, MenuError> {
        self.registry
            .get(location_key)
            .ok_or_else(|| MenuError::UnknownLocation(location_key.to_string()))
    }

    fn build_url(&self, location: &Location, date: NaiveDate) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("platform", PLATFORM)
                .append_pair("date", &date.format("%Y-%m-%d").to_string());
            for (name, value) in location.query_pairs() {
                query.append_pair(name, value);
            }
        }
        url
    }

    /// Reads and parses the cached entry for `key`, if there is one
    fn read_cached(&self, key: &CacheKey) -> Result<Option<MenuDocument>, MenuError> {
        let path = self.cache.cache_path(key);
        let bytes = match self.cache.read_raw(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(None),
            Err(source) => return Err(MenuError::CacheRead { path, source }),
        };

        let menu = serde_json::from_slice(&bytes)
            .map_err(|source| MenuError::CacheCorrupt { path, source })?;
        debug!(%key, "Loaded menu from cache");
        Ok(Some(menu))
    }

    /// Fetches the raw response body, failing on anything but HTTP 200
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, MenuError> {
        let network_error = |source: reqwest::Error| MenuError::Network {
            url: url.to_string(),
            source,
        };

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), %url, "Menu API returned an error status");
            return Err(MenuError::UpstreamStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await.map_err(network_error)?;
        Ok(body.to_vec())
    }
}

/// The caller's current calendar date
fn today() -> NaiveDate {
    Local::now().date_naive()
}
