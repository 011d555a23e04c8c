use endpoint_scraper::config::{ClientConfig, EndpointRegistry, EndpointSet};
use endpoint_scraper::endpoint::{build_http_client, Endpoint};
use endpoint_scraper::server::router;
use std::collections::BTreeMap;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Starts the front end on an ephemeral port and returns its base URL
async fn start_front_end(registry: Arc<EndpointRegistry>) -> String {
    let client = build_http_client(&ClientConfig::default()).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router(registry, client)).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn json_body(response: reqwest::Response) -> serde_json::Value {
    let text = response.text().await.unwrap();
    serde_json::from_str(&text).expect("Response is not JSON")
}

fn registry_for(upstream: &str) -> Arc<EndpointRegistry> {
    let list = Endpoint::new(format!("{}/items/{{{{q}}}}", upstream))
        .with_list("li")
        .unwrap()
        .with_field("name", "span.name")
        .unwrap();
    let single = Endpoint::new(format!("{}/page", upstream))
        .with_field("heading", "h1")
        .unwrap();

    let mut endpoints = BTreeMap::new();
    endpoints.insert("/list".to_string(), list);
    endpoints.insert("single".to_string(), single);

    Arc::new(EndpointRegistry::new(EndpointSet::new(
        endpoints,
        "test".to_string(),
    )))
}

async fn mount_upstream(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/items/fruit"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<ul><li><span class="name">apple</span></li><li><span class="name">pear</span></li></ul>"#,
        ))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Welcome</h1>"))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_list_endpoint_returns_array() {
    let upstream = MockServer::start().await;
    mount_upstream(&upstream).await;
    let base = start_front_end(registry_for(&upstream.uri())).await;

    let response = reqwest::get(format!("{}/list?q=fruit", base)).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "application/json");

    let body = json_body(response).await;
    assert_eq!(body, serde_json::json!([{ "name": "apple" }, { "name": "pear" }]));
}

#[tokio::test]
async fn test_single_endpoint_returns_object() {
    let upstream = MockServer::start().await;
    mount_upstream(&upstream).await;
    let base = start_front_end(registry_for(&upstream.uri())).await;

    let response = reqwest::get(format!("{}/single", base)).await.unwrap();
    assert_eq!(response.status(), 200);

    let body = json_body(response).await;
    assert_eq!(body, serde_json::json!({ "heading": "Welcome" }));
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let upstream = MockServer::start().await;
    let base = start_front_end(registry_for(&upstream.uri())).await;

    let response = reqwest::get(format!("{}/nope", base)).await.unwrap();
    assert_eq!(response.status(), 404);
    assert_eq!(response.text().await.unwrap(), "Not found");
}

#[tokio::test]
async fn test_missing_parameter_is_bad_request() {
    let upstream = MockServer::start().await;
    let base = start_front_end(registry_for(&upstream.uri())).await;

    let response = reqwest::get(format!("{}/list", base)).await.unwrap();
    assert_eq!(response.status(), 400);
    assert!(response.text().await.unwrap().contains("q"));
}

#[tokio::test]
async fn test_published_set_is_served_without_restart() {
    let upstream = MockServer::start().await;
    mount_upstream(&upstream).await;
    let registry = registry_for(&upstream.uri());
    let base = start_front_end(Arc::clone(&registry)).await;

    let before = reqwest::get(format!("{}/fresh", base)).await.unwrap();
    assert_eq!(before.status(), 404);

    let mut endpoints = BTreeMap::new();
    endpoints.insert(
        "/fresh".to_string(),
        Endpoint::new(format!("{}/page", upstream.uri()))
            .with_field("heading", "h1")
            .unwrap(),
    );
    registry.publish(EndpointSet::new(endpoints, "next".to_string()));

    let after = reqwest::get(format!("{}/fresh", base)).await.unwrap();
    assert_eq!(after.status(), 200);
    let body = json_body(after).await;
    assert_eq!(body["heading"], "Welcome");
}
