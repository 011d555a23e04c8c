use crate::config::registry::EndpointSet;
use crate::config::types::EndpointConfig;
use crate::config::validation::validate_endpoint;
use crate::endpoint::Endpoint;
use crate::{CompileError, ConfigError};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Format of an endpoint definitions file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Picks the format from the file extension; anything but `.toml` is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

/// An endpoint that could not be loaded
#[derive(Debug)]
pub struct EndpointFailure {
    /// The request path the endpoint was keyed by
    pub path: String,

    /// Why it was rejected
    pub error: ConfigError,
}

/// Result of loading a definitions file
///
/// A broken endpoint does not prevent the others from loading; it is
/// reported in `failures` instead.
#[derive(Debug)]
pub struct LoadedConfig {
    pub endpoints: EndpointSet,
    pub failures: Vec<EndpointFailure>,
}

/// Loads, validates and compiles every endpoint in a definitions file
///
/// # Arguments
///
/// * `path` - Path to a JSON or TOML file mapping request paths to endpoints
///
/// # Returns
///
/// * `Ok(LoadedConfig)` - The endpoints that compiled, plus per-endpoint failures
/// * `Err(ConfigError)` - The file could not be read or is not a mapping
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use endpoint_scraper::config::load_endpoints;
///
/// let loaded = load_endpoints(Path::new("endpoints.json")).unwrap();
/// println!("{} endpoints loaded", loaded.endpoints.len());
/// ```
pub fn load_endpoints(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_endpoints(&content, ConfigFormat::from_path(path))
}

/// Parses and compiles endpoint definitions from a string
pub fn parse_endpoints(content: &str, format: ConfigFormat) -> Result<LoadedConfig, ConfigError> {
    // Each endpoint is decoded on its own so one bad entry cannot sink the file
    let raw: BTreeMap<String, serde_json::Value> = match format {
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Toml => toml::from_str(content)?,
    };

    let mut endpoints = BTreeMap::new();
    let mut failures = Vec::new();

    for (path, value) in raw {
        let compiled = serde_json::from_value::<EndpointConfig>(value)
            .map_err(ConfigError::from)
            .and_then(|config| compile_endpoint(&path, config));

        match compiled {
            Ok(endpoint) => {
                tracing::debug!("Loaded endpoint {} ({})", path, endpoint.name);
                endpoints.insert(path, endpoint);
            }
            Err(error) => {
                tracing::error!("Failed to load endpoint {}: {}", path, error);
                failures.push(EndpointFailure { path, error });
            }
        }
    }

    Ok(LoadedConfig {
        endpoints: EndpointSet::new(endpoints, hash_content(content)),
        failures,
    })
}

/// Validates one endpoint definition and compiles its extraction specs
pub fn compile_endpoint(path: &str, config: EndpointConfig) -> Result<Endpoint, ConfigError> {
    validate_endpoint(path, &config)?;

    let name = config
        .name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| path.to_string());

    let mut endpoint = Endpoint::new(config.url)
        .with_name(name)
        .with_debug(config.debug);
    endpoint.method = config
        .method
        .filter(|m| !m.is_empty())
        .map(|m| m.to_ascii_uppercase());
    endpoint.body = config.body.filter(|b| !b.is_empty());
    endpoint.headers = config.headers;

    if let Some(list) = config.list.filter(|l| !l.trim().is_empty()) {
        endpoint = endpoint.with_list(&list)?;
    }

    for (field, spec) in config.result {
        let chain = spec.compile().map_err(|e| CompileError::Field {
            field: field.clone(),
            source: Box::new(e),
        })?;
        endpoint = endpoint.with_chain(field, chain);
    }

    endpoint.validate()?;
    Ok(endpoint)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// This is used to detect whether a reload actually changed anything.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
