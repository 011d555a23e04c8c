use crate::config::types::EndpointConfig;
use crate::endpoint::{placeholders, render_raw, ParamSet};
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use url::Url;

/// Validates an endpoint definition before its specs are compiled
pub fn validate_endpoint(path: &str, config: &EndpointConfig) -> Result<(), ConfigError> {
    validate_path(path)?;
    validate_url(&config.url)?;

    if let Some(method) = config.method.as_deref().filter(|m| !m.is_empty()) {
        validate_method(method)?;
    }

    for (name, value) in &config.headers {
        validate_header(name, value)?;
    }

    Ok(())
}

/// Validates the request path an endpoint is served under
fn validate_path(path: &str) -> Result<(), ConfigError> {
    if path.is_empty() {
        return Err(ConfigError::Validation(
            "endpoint path cannot be empty".to_string(),
        ));
    }

    if path.chars().any(|c| c.is_whitespace() || c == '?' || c == '#') {
        return Err(ConfigError::Validation(format!(
            "endpoint path '{}' cannot contain whitespace, '?' or '#'",
            path
        )));
    }

    Ok(())
}

/// Stand-in rendered for every placeholder; valid in a host, port, path or query
const PLACEHOLDER_STAND_IN: &str = "0";

/// Validates a URL template by rendering every placeholder with a stand-in
///
/// A template that starts with a placeholder supplies its scheme at run time
/// and is only checked when a request is built.
fn validate_url(template: &str) -> Result<(), ConfigError> {
    let template = template.trim();
    if template.is_empty() {
        return Err(ConfigError::Validation("url cannot be empty".to_string()));
    }
    if template.starts_with("{{") && !placeholders(template).is_empty() {
        return Ok(());
    }

    let stand_ins: ParamSet = placeholders(template)
        .into_iter()
        .map(|name| (name.to_string(), PLACEHOLDER_STAND_IN.to_string()))
        .collect();

    let rendered = render_raw(template, &stand_ins)
        .map_err(|e| ConfigError::Validation(format!("url '{}': {}", template, e)))?;

    let url = Url::parse(&rendered)
        .map_err(|e| ConfigError::Validation(format!("Invalid url '{}': {}", template, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "url '{}' must use http or https",
            template
        )));
    }

    Ok(())
}

/// Accepts any RFC 7230 token, e.g. `M-SEARCH`
fn validate_method(method: &str) -> Result<(), ConfigError> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| ConfigError::Validation(format!("Invalid method '{}'", method)))?;

    Ok(())
}

fn validate_header(name: &str, value: &str) -> Result<(), ConfigError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ConfigError::Validation(format!("Invalid header name '{}'", name)))?;

    HeaderValue::from_str(value)
        .map_err(|_| ConfigError::Validation(format!("Invalid value for header '{}'", name)))?;

    Ok(())
}
