//! Structured-record adapter
//!
//! Lets a caller drive an endpoint from its own request type instead of a
//! definitions file. The type describes its fields through [`ScrapeTarget`]:
//!
//! - a `URL` text field whose tag is the default URL template
//! - a `Result` field, either a single item or a list of items; a list needs
//!   the list selector as its tag and every item field needs a spec tag
//! - optional `Method`, `Body`, `Headers` and `Debug` fields
//! - any other text field becomes a template parameter, named by its tag or
//!   by its field name with the first letter lower-cased
//!
//! Only list results can be written back. The core endpoint types know
//! nothing about this module.

mod shape;

pub use shape::{FieldValue, ItemField, ResultShape, StructField};

use crate::endpoint::{Endpoint, ParamSet, Record};
use crate::extract::compile;
use crate::{AdapterError, CompileError, Result};
use reqwest::Client;

/// Field names that never become template parameters
pub const RESERVED_FIELDS: [&str; 5] = ["_", "Method", "URL", "Body", "Result"];

/// A caller-owned request type that can be executed as an endpoint
pub trait ScrapeTarget {
    /// Describes every field of the type, in declaration order
    fn fields(&self) -> Vec<StructField>;

    /// Receives the records of a list-shaped result
    fn store_results(&mut self, records: Vec<Record>) -> std::result::Result<(), AdapterError>;
}

/// Builds an item from an extracted record
///
/// Records are keyed by the item field names given in [`ItemField::name`].
pub trait FromRecord: Sized {
    fn from_record(record: &Record) -> Self;
}

/// Converts records into items
pub fn collect_items<T: FromRecord>(records: &[Record]) -> Vec<T> {
    records.iter().map(T::from_record).collect()
}

/// Derives an endpoint from a field description
pub fn endpoint_from_fields(fields: &[StructField]) -> Result<Endpoint> {
    let find = |name: &str| fields.iter().find(|f| f.name == name);

    let (url_tag, url_value) = match find("URL") {
        Some(StructField {
            tag,
            value: FieldValue::Text(value),
            ..
        }) => (*tag, value.as_str()),
        _ => return Err(AdapterError::MissingUrl.into()),
    };
    let url = if url_value.is_empty() {
        url_tag.unwrap_or_default()
    } else {
        url_value
    };

    let mut endpoint = Endpoint::new(url);

    if let Some(FieldValue::Text(method)) = find("Method").map(|f| &f.value) {
        if !method.is_empty() {
            endpoint = endpoint.with_method(method.as_str());
        }
    }
    if let Some(FieldValue::Text(body)) = find("Body").map(|f| &f.value) {
        if !body.is_empty() {
            endpoint = endpoint.with_body(body.as_str());
        }
    }
    if let Some(FieldValue::Headers(headers)) = find("Headers").map(|f| &f.value) {
        endpoint.headers = headers.clone();
    }
    if let Some(FieldValue::Flag(debug)) = find("Debug").map(|f| &f.value) {
        endpoint = endpoint.with_debug(*debug);
    }

    let result = find("Result").ok_or(AdapterError::MissingResult)?;
    let items = match (&result.value, result.tag) {
        (FieldValue::Result(ResultShape::List(items)), Some(list)) if !list.is_empty() => {
            endpoint = endpoint.with_list(list)?;
            items
        }
        (FieldValue::Result(ResultShape::List(_)), _) => {
            return Err(AdapterError::MissingListSelector.into())
        }
        (FieldValue::Result(ResultShape::Single(items)), _) => items,
        _ => return Err(AdapterError::MissingResult.into()),
    };

    for item in items {
        let spec = item
            .tag
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AdapterError::MissingSelector {
                field: item.name.to_string(),
            })?;
        let chain = compile(spec).map_err(|e| CompileError::Field {
            field: item.name.to_string(),
            source: Box::new(e),
        })?;
        endpoint = endpoint.with_chain(item.name, chain);
    }

    Ok(endpoint)
}

/// Derives template parameters from every non-reserved text field
pub fn params_from_fields(fields: &[StructField]) -> ParamSet {
    fields
        .iter()
        .filter(|f| !RESERVED_FIELDS.contains(&f.name))
        .filter_map(|f| match &f.value {
            FieldValue::Text(value) => Some((param_name(f), value.clone())),
            _ => None,
        })
        .collect()
}

fn param_name(field: &StructField) -> String {
    if let Some(tag) = field.tag.filter(|t| !t.is_empty()) {
        return tag.to_string();
    }
    let mut chars = field.name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Hands records back to the target according to its result shape
pub fn write_back<T: ScrapeTarget + ?Sized>(
    target: &mut T,
    records: Vec<Record>,
) -> std::result::Result<(), AdapterError> {
    let fields = target.fields();
    match fields.iter().find(|f| f.name == "Result").map(|f| &f.value) {
        Some(FieldValue::Result(ResultShape::List(_))) => target.store_results(records),
        Some(FieldValue::Result(ResultShape::Single(_))) => Err(AdapterError::SingleNotImplemented),
        _ => Err(AdapterError::MissingResult),
    }
}

/// Derives an endpoint and parameters from `target`, executes it and writes
/// the records back
pub async fn execute_target<T: ScrapeTarget + ?Sized>(client: &Client, target: &mut T) -> Result<()> {
    let fields = target.fields();
    let endpoint = endpoint_from_fields(&fields)?;
    if endpoint.debug {
        tracing::info!(
            endpoint = %serde_json::to_string(&endpoint).unwrap_or_default(),
            "computed endpoint"
        );
    }

    let params = params_from_fields(&fields);
    let records = endpoint.execute(client, &params).await?;
    write_back(target, records)?;
    Ok(())
}
