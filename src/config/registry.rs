//! Live endpoint set with atomic replacement
//!
//! The registry holds an immutable [`EndpointSet`] snapshot. Readers clone
//! the `Arc` and keep using their snapshot for the whole execution; a reload
//! builds a complete new set and swaps it in with a single write.

use crate::config::parser::{load_endpoints, EndpointFailure};
use crate::endpoint::Endpoint;
use crate::ConfigError;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// An immutable set of compiled endpoints keyed by request path
#[derive(Debug, Default)]
pub struct EndpointSet {
    endpoints: BTreeMap<String, Arc<Endpoint>>,
    hash: String,
}

impl EndpointSet {
    /// Builds a set; paths without a leading `/` get one
    pub fn new(endpoints: BTreeMap<String, Endpoint>, hash: String) -> Self {
        let endpoints = endpoints
            .into_iter()
            .map(|(path, endpoint)| (normalize_path(&path), Arc::new(endpoint)))
            .collect();
        Self { endpoints, hash }
    }

    /// Looks up the endpoint served at `path`
    pub fn get(&self, path: &str) -> Option<Arc<Endpoint>> {
        self.endpoints.get(&normalize_path(path)).cloned()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Endpoint>)> {
        self.endpoints.iter().map(|(path, e)| (path.as_str(), e))
    }

    /// Hash of the configuration content this set was built from
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// What a reload did
#[derive(Debug)]
pub enum ReloadOutcome {
    /// The file content hash matched the live set; nothing was swapped
    Unchanged,

    /// A new set was published
    Reloaded {
        endpoints: usize,
        failures: Vec<EndpointFailure>,
    },
}

/// Shared handle to the live endpoint set
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    current: RwLock<Arc<EndpointSet>>,
}

impl EndpointRegistry {
    pub fn new(set: EndpointSet) -> Self {
        Self {
            current: RwLock::new(Arc::new(set)),
        }
    }

    /// Returns the live set; it stays valid even if a reload happens later
    pub fn snapshot(&self) -> Arc<EndpointSet> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the live set and returns the previous one
    pub fn publish(&self, set: EndpointSet) -> Arc<EndpointSet> {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, Arc::new(set))
    }

    /// Loads `path` and publishes the result
    ///
    /// If the file cannot be read or parsed the live set is left untouched
    /// and the error is returned.
    pub fn reload_from(&self, path: &Path) -> Result<ReloadOutcome, ConfigError> {
        let loaded = load_endpoints(path)?;

        if loaded.endpoints.hash() == self.snapshot().hash() {
            tracing::info!("Configuration unchanged (hash: {})", loaded.endpoints.hash());
            return Ok(ReloadOutcome::Unchanged);
        }

        let count = loaded.endpoints.len();
        tracing::info!(
            "Publishing {} endpoints (hash: {})",
            count,
            loaded.endpoints.hash()
        );
        self.publish(loaded.endpoints);

        Ok(ReloadOutcome::Reloaded {
            endpoints: count,
            failures: loaded.failures,
        })
    }
}
