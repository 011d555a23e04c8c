use endpoint_scraper::adapter::{
    collect_items, execute_target, FieldValue, FromRecord, ItemField, ResultShape, ScrapeTarget,
    StructField,
};
use endpoint_scraper::config::ClientConfig;
use endpoint_scraper::endpoint::build_http_client;
use endpoint_scraper::{AdapterError, Record, ScrapeError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PAGE: &str = r#"<html><body>
    <div class="g"><h3><span>Rust Programming Language</span></h3><a href="https://www.rust-lang.org/">x</a></div>
    <div class="g"><h3><span>The Rust Book</span></h3><a href="https://doc.rust-lang.org/book/">x</a></div>
    <div class="g"><h3><span>Ad without a link</span></h3></div>
</body></html>"#;

#[derive(Debug, Default, PartialEq)]
struct SearchResult {
    title: String,
    url: String,
}

impl FromRecord for SearchResult {
    fn from_record(record: &Record) -> Self {
        Self {
            title: record.get("Title").unwrap_or_default().to_string(),
            url: record.get("URL").unwrap_or_default().to_string(),
        }
    }
}

struct Search {
    base_url: String,
    query: String,
    results: Vec<SearchResult>,
}

impl ScrapeTarget for Search {
    fn fields(&self) -> Vec<StructField> {
        vec![
            StructField::text("URL", None, format!("{}/search?q={{{{query}}}}", self.base_url)),
            StructField::new(
                "Result",
                Some("div.g"),
                FieldValue::Result(ResultShape::List(vec![
                    ItemField {
                        name: "Title",
                        tag: Some("h3 span"),
                    },
                    ItemField {
                        name: "URL",
                        tag: Some("a[href] | @href"),
                    },
                ])),
            ),
            StructField::new("Debug", None, FieldValue::Flag(true)),
            StructField::text("Query", Some("query"), self.query.clone()),
        ]
    }

    fn store_results(&mut self, records: Vec<Record>) -> Result<(), AdapterError> {
        self.results = collect_items(&records);
        Ok(())
    }
}

#[tokio::test]
async fn test_execute_target_fills_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rust lang"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = build_http_client(&ClientConfig::default()).unwrap();
    let mut search = Search {
        base_url: mock_server.uri(),
        query: "rust lang".to_string(),
        results: Vec::new(),
    };

    execute_target(&client, &mut search).await.expect("Execution failed");

    assert_eq!(
        search.results,
        vec![
            SearchResult {
                title: "Rust Programming Language".to_string(),
                url: "https://www.rust-lang.org/".to_string(),
            },
            SearchResult {
                title: "The Rust Book".to_string(),
                url: "https://doc.rust-lang.org/book/".to_string(),
            },
        ]
    );
}

struct Headline {
    base_url: String,
}

impl ScrapeTarget for Headline {
    fn fields(&self) -> Vec<StructField> {
        vec![
            StructField::text("URL", None, self.base_url.clone()),
            StructField::new(
                "Result",
                None,
                FieldValue::Result(ResultShape::Single(vec![ItemField {
                    name: "Title",
                    tag: Some("h1"),
                }])),
            ),
        ]
    }

    fn store_results(&mut self, _: Vec<Record>) -> Result<(), AdapterError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_single_result_write_back_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Top story</h1>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = build_http_client(&ClientConfig::default()).unwrap();
    let mut headline = Headline {
        base_url: mock_server.uri(),
    };

    let result = execute_target(&client, &mut headline).await;
    assert!(matches!(
        result,
        Err(ScrapeError::Adapter(AdapterError::SingleNotImplemented))
    ));
}
