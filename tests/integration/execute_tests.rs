use endpoint_scraper::config::{load_endpoints, ClientConfig, EndpointRegistry};
use endpoint_scraper::endpoint::{build_http_client, Endpoint, ParamSet, DEFAULT_USER_AGENT};
use endpoint_scraper::ScrapeError;
use reqwest::Client;
use std::io::Write;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ITEMS_PAGE: &str = r#"<html><head><title>Results</title></head><body>
    <div class="item"><h3>Cats are great</h3><a href="https://cats.test/great">read</a></div>
    <div class="item"><h3>Why cats purr</h3><a href="https://cats.test/purr">read</a></div>
</body></html>"#;

fn client() -> Client {
    build_http_client(&ClientConfig::default()).expect("Failed to build client")
}

fn params(pairs: &[(&str, &str)]) -> ParamSet {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

fn items_endpoint(base_url: &str) -> Endpoint {
    Endpoint::new(format!("{}/{{{{q}}}}", base_url))
        .with_name("items")
        .with_list("div.item")
        .unwrap()
        .with_field("title", "h3")
        .unwrap()
        .with_chain(
            "link",
            endpoint_scraper::extract::Chain::from_tokens(["a[href]", "@href"]).unwrap(),
        )
}

#[tokio::test]
async fn test_list_endpoint_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cats"))
        .respond_with(html(ITEMS_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let endpoint = items_endpoint(&mock_server.uri());
    let records = endpoint
        .execute(&client(), &params(&[("q", "cats")]))
        .await
        .expect("Execution failed");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("title"), Some("Cats are great"));
    assert_eq!(records[0].get("link"), Some("https://cats.test/great"));
    assert_eq!(records[1].get("title"), Some("Why cats purr"));
    assert_eq!(records[1].get("link"), Some("https://cats.test/purr"));
}

#[tokio::test]
async fn test_incomplete_items_are_dropped() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(html(
            r#"<div class="item"><h3>one</h3><a href="/1">x</a></div>
               <div class="item"><h3>two</h3></div>
               <div class="item"><h3>three</h3><a href="/3">x</a></div>"#,
        ))
        .mount(&mock_server)
        .await;

    let endpoint = items_endpoint(&mock_server.uri());
    let records = endpoint
        .execute(&client(), &params(&[("q", "list")]))
        .await
        .unwrap();

    let titles: Vec<_> = records.iter().filter_map(|r| r.get("title")).collect();
    assert_eq!(titles, vec!["one", "three"]);
    assert!(records.iter().all(|r| r.len() == 2));
}

#[tokio::test]
async fn test_query_parameters_are_escaped() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "a b&c"))
        .respond_with(html("<h1>found</h1>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let endpoint = Endpoint::new(format!("{}/search?q={{{{query}}}}", mock_server.uri()))
        .with_field("heading", "h1")
        .unwrap();

    let records = endpoint
        .execute(&client(), &params(&[("query", "a b&c")]))
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("heading"), Some("found"));
}

#[tokio::test]
async fn test_post_with_body_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/form"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(header("x-api-key", "secret"))
        .and(body_string("q=cats+%26+dogs"))
        .respond_with(html(r#"<p class="count">Found 12 results</p>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let endpoint = Endpoint::new(format!("{}/form", mock_server.uri()))
        .with_method("POST")
        .with_body("q={{q}}")
        .with_header("Content-Type", "application/x-www-form-urlencoded")
        .with_header("X-Api-Key", "secret")
        .with_field("count", "p.count | /(\\d+)/")
        .unwrap();

    let records = endpoint
        .execute(&client(), &params(&[("q", "cats & dogs")]))
        .await
        .unwrap();

    assert_eq!(records[0].get("count"), Some("12"));
}

#[tokio::test]
async fn test_default_user_agent_is_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html("<h1>ok</h1>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let endpoint = Endpoint::new(mock_server.uri())
        .with_field("heading", "h1")
        .unwrap();
    let records = endpoint.execute(&client(), &ParamSet::new()).await.unwrap();
    assert_eq!(records[0].get("heading"), Some("ok"));

    let requests = mock_server
        .received_requests()
        .await
        .expect("Request recording is disabled");
    assert_eq!(requests.len(), 1);
    assert_eq!(
        received_user_agent(&requests[0]).as_deref(),
        Some(DEFAULT_USER_AGENT)
    );
}

/// The User-Agent as sent; the mock server splits header values on commas
fn received_user_agent(request: &wiremock::Request) -> Option<String> {
    request
        .headers
        .iter()
        .find(|(name, _)| name.as_str().eq_ignore_ascii_case("user-agent"))
        .map(|(_, values)| {
            values
                .iter()
                .map(|value| value.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
}

#[tokio::test]
async fn test_explicit_user_agent_is_kept() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("user-agent", "custom-agent/2.0"))
        .respond_with(html("<h1>ok</h1>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let endpoint = Endpoint::new(mock_server.uri())
        .with_header("User-Agent", "custom-agent/2.0")
        .with_field("heading", "h1")
        .unwrap();
    let records = endpoint.execute(&client(), &ParamSet::new()).await.unwrap();

    assert_eq!(records[0].get("heading"), Some("ok"));
}

#[tokio::test]
async fn test_error_status_body_is_still_parsed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<h1>Not here</h1>"))
        .mount(&mock_server)
        .await;

    let endpoint = Endpoint::new(mock_server.uri())
        .with_field("heading", "h1")
        .unwrap()
        .with_debug(true);
    let records = endpoint.execute(&client(), &ParamSet::new()).await.unwrap();

    assert_eq!(records[0].get("heading"), Some("Not here"));
}

#[tokio::test]
async fn test_single_mode_returns_empty_record() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html("<p>nothing to see</p>"))
        .mount(&mock_server)
        .await;

    let endpoint = Endpoint::new(mock_server.uri())
        .with_field("heading", "h1")
        .unwrap()
        .with_field("link", "a | @href")
        .unwrap();
    let records = endpoint.execute(&client(), &ParamSet::new()).await.unwrap();

    assert_eq!(records.len(), 1);
    assert!(records[0].is_empty());
}

#[tokio::test]
async fn test_missing_parameter_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html("<h1>unused</h1>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let endpoint = items_endpoint(&mock_server.uri());
    let result = endpoint.execute(&client(), &ParamSet::new()).await;

    match result {
        Err(ScrapeError::Template(e)) => assert!(e.to_string().contains("q")),
        other => panic!("expected template error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    let endpoint = Endpoint::new("http://127.0.0.1:1/")
        .with_field("heading", "h1")
        .unwrap();
    let result = endpoint.execute(&client(), &ParamSet::new()).await;

    assert!(matches!(result, Err(ScrapeError::Network { .. })));
}

#[tokio::test]
async fn test_configured_endpoint_through_registry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cats"))
        .respond_with(html(ITEMS_PAGE))
        .mount(&mock_server)
        .await;

    let config = format!(
        r#"{{
            "/items": {{
                "url": "{}/{{{{q}}}}",
                "list": "div.item",
                "result": {{ "title": ["h3"], "link": ["a[href]", "@href"] }}
            }},
            "/broken": {{ "url": "{}/", "result": {{ "x": "div[" }} }}
        }}"#,
        mock_server.uri(),
        mock_server.uri()
    );

    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("Failed to create config file");
    file.write_all(config.as_bytes()).unwrap();
    file.flush().unwrap();

    let loaded = load_endpoints(file.path()).expect("Failed to load config");
    assert_eq!(loaded.failures.len(), 1);
    assert_eq!(loaded.failures[0].path, "/broken");

    let registry = EndpointRegistry::new(loaded.endpoints);
    let endpoint = registry.snapshot().get("/items").expect("Endpoint missing");
    let records = endpoint
        .execute(&client(), &params(&[("q", "cats")]))
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[1].get("link"), Some("https://cats.test/purr"));
}
