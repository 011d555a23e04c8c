//! Request template rendering
//!
//! Templates reference parameters as `{{name}}`. Every referenced name must be
//! present in the parameter set; a missing one is an error rather than an
//! empty substitution.

use crate::TemplateError;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;
use url::form_urlencoded;

/// Named parameters substituted into URL and body templates
pub type ParamSet = HashMap<String, String>;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("valid placeholder regex")
});

/// How substituted values are written into the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escaping {
    /// `application/x-www-form-urlencoded` escaping (space becomes `+`)
    Query,
    /// Values are inserted verbatim
    Raw,
}

/// Renders a template with query escaping
///
/// # Example
///
/// ```
/// use endpoint_scraper::endpoint::{render, ParamSet};
///
/// let params = ParamSet::from([("query".to_string(), "a b".to_string())]);
/// let url = render("https://example.com/search?q={{query}}", &params).unwrap();
/// assert_eq!(url, "https://example.com/search?q=a+b");
/// ```
pub fn render(template: &str, params: &ParamSet) -> Result<String, TemplateError> {
    render_with(template, params, Escaping::Query)
}

/// Renders a template inserting values verbatim
pub fn render_raw(template: &str, params: &ParamSet) -> Result<String, TemplateError> {
    render_with(template, params, Escaping::Raw)
}

/// Renders a template with the given escaping
pub fn render_with(
    template: &str,
    params: &ParamSet,
    escaping: Escaping,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let value = lookup(&caps, params)?;

        out.push_str(&template[last..whole.start()]);
        match escaping {
            Escaping::Query => out.extend(form_urlencoded::byte_serialize(value.as_bytes())),
            Escaping::Raw => out.push_str(value),
        }
        last = whole.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}

/// Lists the parameter names a template references, in order of appearance
pub fn placeholders(template: &str) -> Vec<&str> {
    PLACEHOLDER_RE
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

fn lookup<'p>(caps: &Captures<'_>, params: &'p ParamSet) -> Result<&'p str, TemplateError> {
    let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| TemplateError::MissingParam {
            name: name.to_string(),
        })
}
