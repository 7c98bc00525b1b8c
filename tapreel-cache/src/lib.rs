//! # Tapreel Offline Cache (tapreel-cache)
//!
//! Offline asset cache for the presentation shell. A named generation of
//! URL-keyed responses is populated at install, older generations are
//! evicted at activation, and fetches are served cache-first. Video clips
//! always go to the network and are never stored.

pub mod cache;
pub mod error;
pub mod network;
pub mod storage;

pub use cache::{is_video_request, normalize_key, AssetCache, FetchSource, Served};
pub use error::{Error, Result};
pub use network::{Network, Request, Response};
pub use storage::CacheStorage;
