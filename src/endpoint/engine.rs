//! Endpoint execution
//!
//! Execution renders the request, sends it, parses the response body and
//! assembles records. In list mode each node matched by the list selector
//! yields a record, and records missing any field are dropped. In single mode
//! the whole document yields exactly one record.
//!
//! Debug tracing is purely observational and never changes the result.

use crate::endpoint::request::build_request;
use crate::endpoint::template::{render, ParamSet};
use crate::endpoint::{Endpoint, ListSelector, Record};
use crate::extract::Chain;
use crate::{Result, ScrapeError};
use reqwest::header::{HeaderName, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Response};
use scraper::{ElementRef, Html};

impl Endpoint {
    /// Executes the endpoint with the given parameters
    ///
    /// # Errors
    ///
    /// * `ScrapeError::Compile` - the endpoint has no fields
    /// * `ScrapeError::Template` - a referenced parameter is missing
    /// * `ScrapeError::InvalidRequest` - method, URL or headers cannot be encoded
    /// * `ScrapeError::Network` - the request could not be sent
    /// * `ScrapeError::Document` - the response body could not be read
    ///
    /// No error is retried.
    pub async fn execute(&self, client: &Client, params: &ParamSet) -> Result<Vec<Record>> {
        self.validate()?;

        let url = render(&self.url, params)?;
        let method = self.effective_method();
        let body = match self.body.as_deref().filter(|b| !b.is_empty()) {
            Some(template) => Some(render(template, params)?),
            None => None,
        };

        if self.debug {
            match &body {
                Some(body) => tracing::info!(
                    endpoint = %self.name,
                    %method,
                    %url,
                    body_size = body.len(),
                    "request"
                ),
                None => tracing::info!(endpoint = %self.name, %method, %url, "request"),
            }
        }

        let request = build_request(client, method, &url, body, &self.headers)?;

        if self.debug {
            for (name, value) in request.headers() {
                tracing::info!(
                    endpoint = %self.name,
                    header = name.as_str(),
                    value = %value.to_str().unwrap_or("<binary>"),
                    "request header"
                );
            }
        }

        let response = client
            .execute(request)
            .await
            .map_err(|source| ScrapeError::Network {
                url: url.clone(),
                source,
            })?;

        if self.debug {
            trace_response(&self.name, &response);
        }

        let html = response.text().await.map_err(|e| ScrapeError::Document {
            url: url.clone(),
            message: e.to_string(),
        })?;

        Ok(self.extract_records(&html))
    }

    /// Parses a document and assembles records from it
    ///
    /// This is the synchronous half of [`Endpoint::execute`].
    pub fn extract_records(&self, html: &str) -> Vec<Record> {
        let document = Html::parse_document(html);

        match &self.list {
            Some(list) => self.extract_list(&document, list),
            None => vec![self.assemble(|chain| chain.execute_document(&document))],
        }
    }

    fn extract_list(&self, document: &Html, list: &ListSelector) -> Vec<Record> {
        let items: Vec<ElementRef<'_>> = document.select(list.selector()).collect();

        if self.debug {
            tracing::info!(
                endpoint = %self.name,
                list = %list.source(),
                matches = items.len(),
                "list selector"
            );
            if items.is_empty() {
                tracing::debug!(
                    endpoint = %self.name,
                    html = %document.root_element().html(),
                    "no list matches"
                );
            }
        }

        let expected = self.fields.len();
        let mut records = Vec::with_capacity(items.len());

        for (index, item) in items.into_iter().enumerate() {
            let record = self.assemble(|chain| chain.execute_on(item));
            if record.len() == expected {
                records.push(record);
            } else if self.debug {
                tracing::info!(
                    endpoint = %self.name,
                    index,
                    fields = record.len(),
                    expected,
                    "excluded incomplete record"
                );
            }
        }

        records
    }

    fn assemble(&self, run: impl Fn(&Chain) -> String) -> Record {
        let mut record = Record::new();

        for (field, chain) in &self.fields {
            let value = run(chain);
            if !value.is_empty() {
                record.insert(field.as_str(), value);
            } else if self.debug {
                tracing::info!(endpoint = %self.name, %field, "missing field");
            }
        }

        record
    }
}

fn trace_response(endpoint: &str, response: &Response) {
    let header = |name: HeaderName| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string()
    };

    tracing::info!(
        endpoint,
        status = response.status().as_u16(),
        content_type = %header(CONTENT_TYPE),
        content_length = %header(CONTENT_LENGTH),
        "response"
    );
}
