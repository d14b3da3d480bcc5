//! HTTP transport used by the conformance rules.
//!
//! Rules drive the service through the [`HttpTransport`] trait so tests can
//! script exchanges without a network; [`ReqwestTransport`] is the real
//! implementation. Each call blocks until the response arrives or the
//! client's timeout elapses — timeout policy belongs to whoever constructs
//! the client, not to the rules.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header;

/// Response fields the rules consume.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
    /// `Location` header, when present.
    pub location: Option<String>,
    /// `ETag` header, when present.
    pub etag: Option<String>,
}

/// Blocking HTTP operations a rule may issue against the service under test.
pub trait HttpTransport {
    /// POSTs a JSON document to a collection URL.
    ///
    /// # Errors
    ///
    /// Returns an error if no response arrives (connection or timeout
    /// failure) — never for a non-success status.
    fn create(&self, url: &str, headers: &[(&str, &str)], body: &str) -> Result<HttpResponse>;

    /// GETs a resource.
    ///
    /// # Errors
    ///
    /// Returns an error if no response arrives.
    fn get(&self, url: &str) -> Result<HttpResponse>;

    /// DELETEs a resource.
    ///
    /// # Errors
    ///
    /// Returns an error if no response arrives.
    fn delete(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse>;

    /// POSTs a multipart batch body to the service's `$batch` endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if no response arrives.
    fn post_batch(&self, url: &str, boundary: &str, body: &str) -> Result<HttpResponse>;
}

/// Transport backed by a blocking `reqwest` client.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds a transport whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be constructed.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }

    fn finish(response: reqwest::blocking::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let location = header_value(&response, header::LOCATION);
        let etag = header_value(&response, header::ETAG);
        let body = response.text().context("failed to read response body")?;
        Ok(HttpResponse {
            status,
            body,
            location,
            etag,
        })
    }
}

fn header_value(response: &reqwest::blocking::Response, name: header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

impl HttpTransport for ReqwestTransport {
    fn create(&self, url: &str, headers: &[(&str, &str)], body: &str) -> Result<HttpResponse> {
        let mut request = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .header("OData-Version", "4.0")
            .body(body.to_owned());
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request
            .send()
            .with_context(|| format!("POST {url} failed"))?;
        Self::finish(response)
    }

    fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .header("OData-Version", "4.0")
            .send()
            .with_context(|| format!("GET {url} failed"))?;
        Self::finish(response)
    }

    fn delete(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        let mut request = self.client.delete(url).header("OData-Version", "4.0");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request
            .send()
            .with_context(|| format!("DELETE {url} failed"))?;
        Self::finish(response)
    }

    fn post_batch(&self, url: &str, boundary: &str, body: &str) -> Result<HttpResponse> {
        let content_type = format!("multipart/mixed; boundary={boundary}");
        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, content_type)
            .header("OData-Version", "4.0")
            .body(body.to_owned())
            .send()
            .with_context(|| format!("POST {url} failed"))?;
        Self::finish(response)
    }
}
