use std::collections::HashMap;

/// One field of a caller's request type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    /// Field name as declared, e.g. `URL` or `Query`
    pub name: &'static str,

    /// Annotation: URL template, list selector or parameter name
    pub tag: Option<&'static str>,

    pub value: FieldValue,
}

impl StructField {
    pub fn new(name: &'static str, tag: Option<&'static str>, value: FieldValue) -> Self {
        Self { name, tag, value }
    }

    /// Shorthand for a text field
    pub fn text(name: &'static str, tag: Option<&'static str>, value: impl Into<String>) -> Self {
        Self::new(name, tag, FieldValue::Text(value.into()))
    }
}

/// The current value of a field, by kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Headers(HashMap<String, String>),
    Result(ResultShape),
    /// Anything the adapter ignores
    Other,
}

/// Shape of the `Result` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultShape {
    Single(Vec<ItemField>),
    List(Vec<ItemField>),
}

/// A field of the result item type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemField {
    pub name: &'static str,

    /// Extraction spec, stages separated by `" | "`
    pub tag: Option<&'static str>,
}
