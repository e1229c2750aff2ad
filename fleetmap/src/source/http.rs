//! HTTP position source.

use std::time::Duration;

use tracing::debug;

use super::parse::parse_positions;
use super::types::{BoxFuture, PositionSource, SourceError};
use crate::store::PositionRecord;

/// Default base URL of the tracking API.
pub const DEFAULT_BASE_URL: &str = "http://0.0.0.0/api/";

/// Default endpoint path, relative to the base URL.
pub const DEFAULT_POSITIONS_PATH: &str = "truckstartingcoordinates/";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for async HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the body bytes.
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, SourceError>>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with the default timeout.
    pub fn new() -> Result<Self, SourceError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new ReqwestClient with custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SourceError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, SourceError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| SourceError::Http(format!("Request failed: {}", e)))?;

            if !response.status().is_success() {
                return Err(SourceError::Http(format!(
                    "HTTP {} from {}",
                    response.status(),
                    url
                )));
            }

            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| SourceError::Http(format!("Failed to read response: {}", e)))
        })
    }
}

/// Join a base URL and a relative path with exactly one slash between them.
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

/// Fetches positions with a GET request to a fixed endpoint.
pub struct HttpPositionSource<C: AsyncHttpClient> {
    http_client: C,
    url: String,
}

impl<C: AsyncHttpClient> HttpPositionSource<C> {
    /// Creates a source for `base_url` + `path`.
    pub fn new(http_client: C, base_url: &str, path: &str) -> Result<Self, SourceError> {
        let url = endpoint_url(base_url, path);
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SourceError::Config(format!(
                "Position source URL must be http(s): {}",
                url
            )));
        }
        Ok(Self { http_client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl HttpPositionSource<ReqwestClient> {
    /// Creates a reqwest-backed source with the given timeout.
    pub fn reqwest(base_url: &str, path: &str, timeout_secs: u64) -> Result<Self, SourceError> {
        Self::new(ReqwestClient::with_timeout(timeout_secs)?, base_url, path)
    }
}

impl<C: AsyncHttpClient> PositionSource for HttpPositionSource<C> {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<PositionRecord>, SourceError>> {
        Box::pin(async move {
            let body = self.http_client.get(&self.url).await?;
            debug!(url = %self.url, bytes = body.len(), "Position response received");
            parse_positions(&body)
        })
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Mock HTTP client for testing
    pub struct MockHttpClient {
        pub response: Result<Vec<u8>, SourceError>,
        pub requested: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        pub fn new(response: Result<Vec<u8>, SourceError>) -> Self {
            Self {
                response,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    impl AsyncHttpClient for MockHttpClient {
        fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, SourceError>> {
            self.requested.lock().push(url.to_string());
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    #[test]
    fn test_endpoint_url_joins_slashes() {
        assert_eq!(
            endpoint_url("http://host/api/", "/trucks/"),
            "http://host/api/trucks/"
        );
        assert_eq!(endpoint_url("http://host/api", "trucks"), "http://host/api/trucks");
        assert_eq!(endpoint_url("http://host/api/", ""), "http://host/api");
    }

    #[test]
    fn test_default_endpoint() {
        assert_eq!(
            endpoint_url(DEFAULT_BASE_URL, DEFAULT_POSITIONS_PATH),
            "http://0.0.0.0/api/truckstartingcoordinates/"
        );
    }

    #[test]
    fn test_rejects_non_http_url() {
        let mock = MockHttpClient::new(Ok(Vec::new()));
        let result = HttpPositionSource::new(mock, "ftp://host", "x");
        assert!(matches!(result, Err(SourceError::Config(_))));
    }

    #[tokio::test]
    async fn test_fetch_parses_body() {
        let body = br#"[{"id":"t1","lat":40.1,"lon":-73.9}]"#.to_vec();
        let source =
            HttpPositionSource::new(MockHttpClient::new(Ok(body)), "http://host/api/", "trucks/")
                .unwrap();

        let records = source.fetch().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            *source.http_client.requested.lock(),
            vec!["http://host/api/trucks/".to_string()]
        );
    }

    #[tokio::test]
    async fn test_fetch_propagates_network_error() {
        let mock = MockHttpClient::new(Err(SourceError::Http("unreachable".to_string())));
        let source = HttpPositionSource::new(mock, "http://host", "trucks").unwrap();

        let err = source.fetch().await.unwrap_err();
        assert_eq!(err.kind(), "network");
    }

    #[tokio::test]
    async fn test_fetch_reports_malformed_body() {
        let mock = MockHttpClient::new(Ok(b"<html>".to_vec()));
        let source = HttpPositionSource::new(mock, "http://host", "trucks").unwrap();

        let err = source.fetch().await.unwrap_err();
        assert_eq!(err.kind(), "malformed");
    }
}
