//! Configuration store
//!
//! The config-merge interceptor fetches the base configuration of an event
//! from a [`ConfigStore`]. [`InMemoryConfigStore`] is a bounded store that
//! evicts the least recently inserted entry once it is full.

use async_trait::async_trait;
use latch_core::Configuration;
use std::collections::{BTreeMap, HashMap, VecDeque};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{DispatchError, Result};

/// Source of named base configurations
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetches the configuration stored as `name` in `namespace`
    ///
    /// # Errors
    /// [`DispatchError::ConfigNotFound`] if there is no such configuration
    async fn get(&self, namespace: &str, name: &str) -> Result<Configuration>;
}

fn key_for(namespace: &str, name: &str) -> String {
    format!("{}.{}", name, namespace)
}

#[derive(Default)]
struct Entries {
    configs: HashMap<String, Configuration>,
    order: VecDeque<String>,
}

/// Bounded in-memory configuration store
pub struct InMemoryConfigStore {
    capacity: usize,
    entries: RwLock<Entries>,
}

impl InMemoryConfigStore {
    /// Creates an empty store holding at most `capacity` configurations
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(Entries::default()),
        }
    }

    /// Creates an empty store sized by `config_cache_size`
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.config_cache_size)
    }

    /// Stores a configuration, evicting the oldest entry if the store is full
    pub async fn insert(&self, namespace: &str, name: &str, config: Configuration) {
        let key = key_for(namespace, name);
        let mut entries = self.entries.write().await;

        if entries.configs.contains_key(&key) {
            entries.order.retain(|k| k != &key);
        } else if entries.configs.len() >= self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                debug!("Evicting config '{}'", oldest);
                entries.configs.remove(&oldest);
            }
        }

        entries.order.push_back(key.clone());
        entries.configs.insert(key, config);
        info!(namespace, name, "Stored config");
    }

    /// Decodes and stores the `config.yaml` entry of a config-map-like data map
    pub async fn load_config_map(
        &self,
        namespace: &str,
        name: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<()> {
        let config = Configuration::from_config_map(data)?;
        self.insert(namespace, name, config).await;
        Ok(())
    }

    /// Removes a configuration, returning whether it was present
    pub async fn remove(&self, namespace: &str, name: &str) -> bool {
        let key = key_for(namespace, name);
        let mut entries = self.entries.write().await;
        entries.order.retain(|k| k != &key);
        entries.configs.remove(&key).is_some()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.configs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Configuration> {
        let entries = self.entries.read().await;
        entries
            .configs
            .get(&key_for(namespace, name))
            .cloned()
            .ok_or_else(|| DispatchError::ConfigNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latch_core::{RunTemplate, Trigger};

    fn config(trigger: &str) -> Configuration {
        Configuration::default()
            .with_trigger(Trigger::new(trigger).with_pipeline(RunTemplate::named("build")))
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryConfigStore::new(4);
        store.insert("ci", "pipeline-config", config("t1")).await;

        let fetched = store.get("ci", "pipeline-config").await.unwrap();
        assert_eq!(fetched.triggers[0].name, "t1");

        let missing = store.get("other", "pipeline-config").await;
        assert!(matches!(missing, Err(DispatchError::ConfigNotFound { .. })));
    }

    #[tokio::test]
    async fn test_evicts_least_recently_inserted() {
        let store = InMemoryConfigStore::new(2);
        store.insert("ci", "a", config("a")).await;
        store.insert("ci", "b", config("b")).await;
        store.insert("ci", "a", config("a2")).await;
        store.insert("ci", "c", config("c")).await;

        assert_eq!(store.len().await, 2);
        assert!(store.get("ci", "b").await.is_err());
        assert_eq!(store.get("ci", "a").await.unwrap().triggers[0].name, "a2");
        assert!(store.get("ci", "c").await.is_ok());
    }

    #[tokio::test]
    async fn test_load_config_map() {
        let store = InMemoryConfigStore::new(2);
        let mut data = BTreeMap::new();
        data.insert(
            "config.yaml".to_string(),
            "triggers:\n  - name: push\n".to_string(),
        );

        store.load_config_map("ci", "cfg", &data).await.unwrap();
        assert_eq!(store.get("ci", "cfg").await.unwrap().triggers[0].name, "push");

        data.insert("config.yaml".to_string(), "trigger: []\n".to_string());
        let err = store.load_config_map("ci", "bad", &data).await.unwrap_err();
        assert!(matches!(err, DispatchError::Resolve(_)));
    }

    #[tokio::test]
    async fn test_capacity_from_config() {
        let store = InMemoryConfigStore::from_config(&Config::default().with_cache_size(1));
        store.insert("ci", "a", config("a")).await;
        store.insert("ci", "b", config("b")).await;

        assert_eq!(store.len().await, 1);
        assert!(store.get("ci", "a").await.is_err());
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemoryConfigStore::new(2);
        store.insert("ci", "a", config("a")).await;

        assert!(store.remove("ci", "a").await);
        assert!(!store.remove("ci", "a").await);
        assert!(store.is_empty().await);
    }
}
