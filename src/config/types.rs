use crate::extract::{compile, Chain};
use crate::CompileError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One endpoint as written in the definitions file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Display name; defaults to the request path it is keyed by
    #[serde(default)]
    pub name: Option<String>,

    /// HTTP method; defaults to GET
    #[serde(default)]
    pub method: Option<String>,

    /// URL template with `{{param}}` placeholders
    pub url: String,

    /// Optional body template
    #[serde(default)]
    pub body: Option<String>,

    /// Request headers sent verbatim
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// CSS selector for list items; enables list mode when set
    #[serde(default)]
    pub list: Option<String>,

    /// Field name to extraction spec
    pub result: BTreeMap<String, FieldSpec>,

    /// Emit trace events for every execution
    #[serde(default, alias = "Debug")]
    pub debug: bool,
}

/// An extraction spec for one field
///
/// A single string may hold several stages separated by `" | "`. Each
/// element of a list is one stage and is not split further.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FieldSpec {
    Spec(String),
    Stages(Vec<String>),
}

impl FieldSpec {
    pub fn compile(&self) -> Result<Chain, CompileError> {
        match self {
            Self::Spec(spec) => compile(spec),
            Self::Stages(stages) => Chain::from_tokens(stages),
        }
    }
}

/// HTTP client settings shared by all endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}
