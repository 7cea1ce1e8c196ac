//! Traced HTTP client
//!
//! Wraps `reqwest::Client`: every request runs inside an `outgoing_http`
//! span and carries a `traceparent` header.

use std::time::Duration;

use crate::http::trace_context;
use tracing::{Instrument, Level};

#[derive(Clone)]
pub struct TracedClient {
    inner: reqwest::Client,
}

impl TracedClient {
    /// Create a new TracedClient wrapping the provided reqwest::Client
    pub fn new(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// Client with a per-request timeout; `None` means no timeout.
    pub fn with_timeout(timeout: Option<Duration>) -> reqwest::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self::new(builder.build()?))
    }

    /// Execute a built request, injecting trace headers.
    pub async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let span = tracing::span!(
            Level::INFO, "outgoing_http",
            http.method = %req.method(),
            http.url = %req.url(),
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
        );

        trace_context::inject_trace_context(req.headers_mut());

        async {
            let response = self.inner.execute(req).await?;
            let status = response.status();
            tracing::Span::current().record("http.status_code", status.as_u16());
            if status.is_client_error() || status.is_server_error() {
                tracing::debug!(status = status.as_u16(), "outgoing request failed");
            }
            Ok(response)
        }
        .instrument(span)
        .await
    }

    /// Build and execute a request prepared with [`TracedClient::request`].
    pub async fn send(&self, builder: reqwest::RequestBuilder) -> reqwest::Result<reqwest::Response> {
        self.execute(builder.build()?).await
    }

    /// Convenience method for GET requests
    pub async fn get(&self, url: &str) -> reqwest::Result<reqwest::Response> {
        self.send(self.inner.get(url)).await
    }

    /// Convenience method for POST requests
    pub async fn post(&self, url: &str) -> reqwest::Result<reqwest::Response> {
        self.send(self.inner.post(url)).await
    }

    /// Start a request builder; pass it back to [`TracedClient::send`].
    pub fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.inner.request(method, url)
    }

    /// Get a reference to the underlying reqwest::Client for advanced usage
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }
}

impl From<reqwest::Client> for TracedClient {
    fn from(c: reqwest::Client) -> Self {
        Self::new(c)
    }
}

impl Default for TracedClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn injects_traceparent_header() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/ping").header_exists("traceparent");
            then.status(200).body("ok");
        });

        let client = TracedClient::default();
        let resp = client.get(&server.url("/ping")).await.unwrap();

        assert!(resp.status().is_success());
        m.assert();
    }

    #[tokio::test]
    async fn send_keeps_builder_headers() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/items")
                .header("authorization", "Bearer abc")
                .header_exists("traceparent");
            then.status(201);
        });

        let client = TracedClient::with_timeout(Some(Duration::from_secs(5))).unwrap();
        let builder = client
            .request(reqwest::Method::POST, &server.url("/items"))
            .bearer_auth("abc");
        let resp = client.send(builder).await.unwrap();

        assert_eq!(resp.status().as_u16(), 201);
        m.assert();
    }

    #[tokio::test]
    async fn error_statuses_are_returned_not_raised() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/boom");
            then.status(503);
        });

        let resp = TracedClient::default()
            .get(&server.url("/boom"))
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 503);
    }
}
