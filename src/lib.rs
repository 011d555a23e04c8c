//! Endpoint-Scraper: declarative HTML extraction over templated HTTP requests
//!
//! An endpoint couples a request template with a set of extraction chains.
//! Executing it renders the request, fetches the document and turns it into
//! one or many flat records of field values.

pub mod adapter;
pub mod config;
pub mod endpoint;
pub mod extract;
pub mod server;

use thiserror::Error;

/// Main error type for endpoint execution
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("HTTP error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("Document error for {url}: {message}")]
    Document { url: String, message: String },
}

impl ScrapeError {
    /// Returns true if the error was caused by the caller or the endpoint
    /// definition rather than by the remote side
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Template(_)
                | Self::Compile(_)
                | Self::Config(_)
                | Self::Adapter(_)
                | Self::InvalidRequest(_)
        )
    }
}

/// Errors raised while compiling extraction specs and endpoint definitions
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Empty extraction stage in '{spec}'")]
    EmptyStage { spec: String },

    #[error("Invalid regex '{token}': {message}")]
    InvalidRegex { token: String, message: String },

    #[error("Invalid selector '{token}': {message}")]
    InvalidSelector { token: String, message: String },

    #[error("Invalid list selector '{token}': {message}")]
    InvalidListSelector { token: String, message: String },

    #[error("Field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<CompileError>,
    },

    #[error("Endpoint '{endpoint}' has no result fields")]
    NoFields { endpoint: String },
}

/// Errors raised while rendering a request template
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Missing parameter '{name}'")]
    MissingParam { name: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Compile(#[from] CompileError),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors raised by the structured-record adapter
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdapterError {
    #[error("expected URL string field")]
    MissingUrl,

    #[error("expected Result struct or list of structs")]
    MissingResult,

    #[error("expected list Result field to have a list selector")]
    MissingListSelector,

    #[error("expected result field {field} to have a selector")]
    MissingSelector { field: String },

    #[error("writing a single Result is not implemented, only lists")]
    SingleNotImplemented,
}

/// Result type alias for endpoint operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{load_endpoints, EndpointRegistry, EndpointSet};
pub use endpoint::{build_http_client, Endpoint, ParamSet, Record};
pub use extract::{compile, Chain};
