//! Configuration module for Endpoint-Scraper
//!
//! This module handles loading, validating and compiling endpoint definition
//! files (JSON or TOML), and publishing them as hot-swappable snapshots.
//!
//! # Example
//!
//! ```no_run
//! use endpoint_scraper::config::{load_endpoints, EndpointRegistry};
//! use std::path::Path;
//!
//! let loaded = load_endpoints(Path::new("endpoints.json")).unwrap();
//! let registry = EndpointRegistry::new(loaded.endpoints);
//! println!("Serving {} endpoints", registry.snapshot().len());
//! ```

mod parser;
mod registry;
mod types;
mod validation;

// Re-export types
pub use registry::{EndpointRegistry, EndpointSet, ReloadOutcome};
pub use types::{ClientConfig, EndpointConfig, FieldSpec};

// Re-export parser functions
pub use parser::{
    compile_endpoint, compute_config_hash, load_endpoints, parse_endpoints, ConfigFormat,
    EndpointFailure, LoadedConfig,
};
