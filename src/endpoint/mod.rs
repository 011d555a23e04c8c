//! Endpoint definitions and execution
//!
//! An [`Endpoint`] is the scraping unit: a request template plus one
//! extraction chain per result field. This module contains:
//! - `template`: `{{name}}` parameter rendering
//! - `request`: HTTP client and request construction
//! - `engine`: execution (fetch, parse, extract, assemble)

mod engine;
mod request;
mod template;

pub use request::{build_http_client, build_request, header_map, DEFAULT_USER_AGENT};
pub use template::{placeholders, render, render_raw, render_with, Escaping, ParamSet};

use crate::extract::{compile, Chain};
use crate::CompileError;
use scraper::Selector;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

/// Method used when an endpoint does not set one
pub const DEFAULT_METHOD: &str = "GET";

/// A single extracted record
///
/// Only fields that produced a non-empty value are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, String>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl FromIterator<(String, String)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The CSS selector that switches an endpoint into list mode
#[derive(Debug, Clone)]
pub struct ListSelector {
    source: String,
    selector: Selector,
}

impl ListSelector {
    pub fn parse(source: &str) -> Result<Self, CompileError> {
        let selector =
            Selector::parse(source).map_err(|e| CompileError::InvalidListSelector {
                token: source.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            source: source.to_string(),
            selector,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl Serialize for ListSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// A compiled scraping endpoint
///
/// Endpoints are immutable once built; a configuration reload builds new
/// ones instead of changing these in place.
#[derive(Debug, Clone, Serialize)]
pub struct Endpoint {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<ListSelector>,
    #[serde(rename = "result")]
    pub fields: BTreeMap<String, Chain>,
    pub debug: bool,
}

impl Endpoint {
    /// Creates an endpoint for a URL template with no fields yet
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            method: None,
            url: url.into(),
            body: None,
            headers: HashMap::new(),
            list: None,
            fields: BTreeMap::new(),
            debug: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets a header; a later value for the same name replaces the earlier one
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_list(mut self, selector: &str) -> Result<Self, CompileError> {
        self.list = Some(ListSelector::parse(selector)?);
        Ok(self)
    }

    /// Compiles `spec` and adds it as a result field
    pub fn with_field(self, field: impl Into<String>, spec: &str) -> Result<Self, CompileError> {
        let field = field.into();
        let chain = compile(spec).map_err(|e| CompileError::Field {
            field: field.clone(),
            source: Box::new(e),
        })?;
        Ok(self.with_chain(field, chain))
    }

    pub fn with_chain(mut self, field: impl Into<String>, chain: Chain) -> Self {
        self.fields.insert(field.into(), chain);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// The configured method, or `GET`
    pub fn effective_method(&self) -> &str {
        self.method
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_METHOD)
    }

    /// Returns true if the endpoint produces a list of records
    pub fn is_list(&self) -> bool {
        self.list.is_some()
    }

    /// Checks the invariants every executable endpoint must hold
    pub fn validate(&self) -> Result<(), CompileError> {
        if self.fields.is_empty() {
            return Err(CompileError::NoFields {
                endpoint: self.name.clone(),
            });
        }
        Ok(())
    }
}
