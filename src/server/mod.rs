//! HTTP front end
//!
//! Every request path is looked up in the current endpoint snapshot and its
//! query string becomes the parameter set. List endpoints answer with a JSON
//! array, single endpoints with one JSON object.

use crate::config::EndpointRegistry;
use crate::endpoint::{ParamSet, Record};
use crate::ScrapeError;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use reqwest::Client;
use std::net::SocketAddr;
use std::sync::Arc;

/// State shared by all request handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<EndpointRegistry>,
    pub client: Client,
}

/// Builds the router serving every configured endpoint
pub fn router(registry: Arc<EndpointRegistry>, client: Client) -> Router {
    Router::new()
        .fallback(handle)
        .with_state(AppState { registry, client })
}

/// Binds `addr` and serves until the listener fails
pub async fn serve(
    addr: SocketAddr,
    registry: Arc<EndpointRegistry>,
    client: Client,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}...", listener.local_addr()?);
    axum::serve(listener, router(registry, client)).await
}

async fn handle(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<ParamSet>,
) -> Response {
    let Some(endpoint) = state.registry.snapshot().get(uri.path()) else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    match endpoint.execute(&state.client, &params).await {
        Ok(records) => {
            tracing::info!(
                "{} {} => {} records",
                endpoint.effective_method(),
                uri.path(),
                records.len()
            );
            json_response(&render_records(records, endpoint.is_list()))
        }
        Err(e) => {
            tracing::warn!("{} failed: {}", uri.path(), e);
            (status_for(&e), e.to_string()).into_response()
        }
    }
}

/// Maps an execution error to the status code returned to the caller
pub fn status_for(error: &ScrapeError) -> StatusCode {
    if error.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Shapes records for output: a list, or the single record of a single endpoint
pub fn render_records(records: Vec<Record>, is_list: bool) -> serde_json::Value {
    if is_list {
        serde_json::to_value(records).unwrap_or_default()
    } else {
        records
            .into_iter()
            .next()
            .and_then(|record| serde_json::to_value(record).ok())
            .unwrap_or_else(|| serde_json::json!({}))
    }
}

fn json_response(value: &serde_json::Value) -> Response {
    match serde_json::to_string_pretty(value) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
