//! Named cache generations
//!
//! Each generation maps a normalized request key to a stored response.
//! Generations are replaced wholesale, never partially written.

use crate::network::Response;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

type Generation = HashMap<String, Response>;

#[derive(Debug, Default)]
pub struct CacheStorage {
    generations: RwLock<BTreeMap<String, Generation>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a complete generation, replacing any previous contents
    pub async fn put_all(&self, name: &str, entries: Vec<(String, Response)>) {
        let generation: Generation = entries.into_iter().collect();
        debug!("Storing {} entries in {}", generation.len(), name);
        self.generations
            .write()
            .await
            .insert(name.to_string(), generation);
    }

    /// Look up `key` in generation `name`
    pub async fn lookup(&self, name: &str, key: &str) -> Option<Response> {
        self.generations
            .read()
            .await
            .get(name)
            .and_then(|generation| generation.get(key))
            .cloned()
    }

    pub async fn delete(&self, name: &str) -> bool {
        self.generations.write().await.remove(name).is_some()
    }

    /// Generation names in sorted order
    pub async fn names(&self) -> Vec<String> {
        self.generations.read().await.keys().cloned().collect()
    }

    pub async fn has(&self, name: &str) -> bool {
        self.generations.read().await.contains_key(name)
    }

    /// Number of entries in generation `name` (0 if absent)
    pub async fn len(&self, name: &str) -> usize {
        self.generations
            .read()
            .await
            .get(name)
            .map_or(0, |generation| generation.len())
    }

    /// Keys stored in generation `name`, sorted
    pub async fn keys(&self, name: &str) -> Vec<String> {
        let generations = self.generations.read().await;
        let mut keys: Vec<String> = generations
            .get(name)
            .map(|generation| generation.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}
