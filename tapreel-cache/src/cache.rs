//! Asset cache lifecycle: install, activate, fetch

use crate::error::{Error, Result};
use crate::network::{Network, Request, Response};
use crate::storage::CacheStorage;
use std::sync::Arc;
use tapreel_common::config::CacheConfig;
use tracing::{debug, info, warn};

/// File extensions treated as video media
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "m4v"];

/// Where a fetched response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Cache,
    Network,
}

/// A fetch result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: Response,
    pub source: FetchSource,
}

/// Normalize a request URL into a cache key
///
/// Keys are paths relative to the scope root: `./x`, `x` and `/x` all map
/// to `/x`, and `./` maps to `/`. Any scheme and host are dropped, as is
/// a fragment; the query string is kept.
pub fn normalize_key(url: &str) -> String {
    let url = url.split('#').next().unwrap_or_default().trim();
    let path = match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            rest.find('/').map_or("", |slash| &rest[slash..])
        }
        None => url,
    };
    let path = path.strip_prefix("./").unwrap_or(path);
    let path = path.trim_start_matches('/');
    format!("/{}", path)
}

/// Whether `request` is for video media
///
/// Decided by the URL's extension, a `video/*` accept header, or a
/// `video` request destination.
pub fn is_video_request(request: &Request) -> bool {
    if request
        .destination
        .as_deref()
        .is_some_and(|d| d.eq_ignore_ascii_case("video"))
    {
        return true;
    }
    if request
        .accept
        .as_deref()
        .is_some_and(|a| a.trim_start().to_ascii_lowercase().starts_with("video/"))
    {
        return true;
    }
    has_video_extension(&request.url)
}

fn has_video_extension(url: &str) -> bool {
    let path = url.split(&['?', '#'][..]).next().unwrap_or_default();
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((_, ext)) => VIDEO_EXTENSIONS
            .iter()
            .any(|video| ext.eq_ignore_ascii_case(video)),
        None => false,
    }
}

/// Cache-first asset cache for the presentation shell
pub struct AssetCache {
    name: String,
    assets: Vec<String>,
    storage: Arc<CacheStorage>,
    network: Arc<dyn Network>,
}

impl AssetCache {
    pub fn new(
        name: impl Into<String>,
        assets: Vec<String>,
        storage: Arc<CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self {
            name: name.into(),
            assets,
            storage,
            network,
        }
    }

    pub fn from_config(
        config: &CacheConfig,
        storage: Arc<CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self::new(config.name.clone(), config.assets.clone(), storage, network)
    }

    /// Current generation name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// Populate the current generation with every non-video asset
    ///
    /// All-or-nothing: if any asset fails, nothing is stored. Returns the
    /// number of entries stored.
    pub async fn install(&self) -> Result<usize> {
        let mut entries = Vec::with_capacity(self.assets.len());
        for asset in &self.assets {
            let request = Request::get(asset.clone());
            if is_video_request(&request) {
                debug!("Not caching video asset {}", asset);
                continue;
            }

            let response = self.fetch_checked(&request).await.map_err(|e| {
                warn!("Install of {} failed on {}: {}", self.name, asset, e);
                Error::Install {
                    cache: self.name.clone(),
                    source: Box::new(e),
                }
            })?;
            entries.push((normalize_key(asset), response));
        }

        let stored = entries.len();
        self.storage.put_all(&self.name, entries).await;
        info!("Installed {} ({} assets)", self.name, stored);
        Ok(stored)
    }

    /// Evict every generation other than the current one
    ///
    /// Returns the evicted generation names.
    pub async fn activate(&self) -> Vec<String> {
        let mut evicted = Vec::new();
        for name in self.storage.names().await {
            if name != self.name && self.storage.delete(&name).await {
                info!("Evicted stale cache {}", name);
                evicted.push(name);
            }
        }
        evicted
    }

    /// Serve a request
    ///
    /// Video goes straight to the network. Anything else is served from
    /// the current generation if present, otherwise from the network
    /// without storing the response.
    pub async fn fetch(&self, request: &Request) -> Result<Served> {
        if is_video_request(request) {
            debug!("Video request {} bypasses the cache", request.url);
            return self.from_network(request).await;
        }

        let key = normalize_key(&request.url);
        if let Some(response) = self.storage.lookup(&self.name, &key).await {
            debug!("Cache hit {}", key);
            return Ok(Served {
                response,
                source: FetchSource::Cache,
            });
        }

        debug!("Cache miss {}", key);
        self.from_network(request).await
    }

    async fn from_network(&self, request: &Request) -> Result<Served> {
        let response = self.network.fetch(request).await?;
        Ok(Served {
            response,
            source: FetchSource::Network,
        })
    }

    async fn fetch_checked(&self, request: &Request) -> Result<Response> {
        let response = self.network.fetch(request).await?;
        if !response.is_success() {
            return Err(Error::Status {
                url: request.url.clone(),
                status: response.status,
            });
        }
        Ok(response)
    }
}
