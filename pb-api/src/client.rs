//! HTTP transport for the PufferBlow server REST API.
//!
//! Wraps reqwest::Client with an explicit base URL, an auth token snapshot,
//! timeout management, and response-to-error mapping driven by the server's
//! JSON `detail` field. Failures surface immediately; nothing is retried.

use std::time::Duration;

use reqwest::{multipart, Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;

use pb_core::config::ClientOptions;
use pb_core::constants;
use pb_core::error::{PbError, PbResult};

/// Error body shape the server uses for every non-2xx response.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: String,
}

/// HTTP client for communicating with a PufferBlow server.
///
/// The base URL is threaded through explicitly at construction; the auth
/// token is a read-only snapshot taken when the client is built and is not
/// updated when the session token rotates.
#[derive(Clone)]
pub struct ApiClient {
    inner: Client,
    /// Base URL for the API (e.g. "http://127.0.0.1:7575/api/v1").
    api_root: String,
    /// Server origin (scheme + host + port, no path).
    origin: String,
    /// Auth token snapshot, empty before sign-in.
    auth_token: String,
    /// Default request timeout.
    timeout: Duration,
    /// Extended timeout for uploads and raw file downloads.
    extended_timeout: Duration,
}

impl ApiClient {
    /// Create a new ApiClient for the given endpoint and token snapshot.
    pub fn new(options: &ClientOptions, auth_token: Option<&str>) -> PbResult<Self> {
        let timeout = Duration::from_millis(options.api_timeout_ms);

        let inner = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(15))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| PbError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner,
            api_root: options.api_root(),
            origin: options.origin(),
            auth_token: auth_token.unwrap_or_default().to_string(),
            timeout,
            extended_timeout: timeout * constants::EXTENDED_TIMEOUT_MULTIPLIER as u32,
        })
    }

    /// Get the current API root URL.
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Get the server origin.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The auth token snapshot this client was built with (empty before sign-in).
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    /// Build the full URL for an API path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path)
    }

    /// Send a request, classifying transport-level failures.
    async fn execute(&self, builder: RequestBuilder) -> PbResult<Response> {
        builder.send().await.map_err(Self::classify_error)
    }

    // --- Request methods ---

    /// Execute a GET request with query parameters.
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> PbResult<Response> {
        debug!("GET {}", path);
        self.execute(self.inner.get(self.url(path)).query(query))
            .await
    }

    /// Execute a GET request with the extended timeout (raw file downloads).
    pub async fn get_extended(&self, path: &str, query: &[(&str, &str)]) -> PbResult<Response> {
        debug!("GET (extended) {}", path);
        self.execute(
            self.inner
                .get(self.url(path))
                .query(query)
                .timeout(self.extended_timeout),
        )
        .await
    }

    /// Execute a POST request with a JSON body.
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> PbResult<Response> {
        debug!("POST {}", path);
        self.execute(self.inner.post(self.url(path)).json(body)).await
    }

    /// Execute a POST request with query parameters and no body.
    pub async fn post_query(&self, path: &str, query: &[(&str, &str)]) -> PbResult<Response> {
        debug!("POST {}", path);
        self.execute(self.inner.post(self.url(path)).query(query))
            .await
    }

    /// Execute a PUT request with a JSON body.
    pub async fn put_json(&self, path: &str, body: &serde_json::Value) -> PbResult<Response> {
        debug!("PUT {}", path);
        self.execute(self.inner.put(self.url(path)).json(body)).await
    }

    /// Execute a DELETE request with query parameters.
    pub async fn delete(&self, path: &str, query: &[(&str, &str)]) -> PbResult<Response> {
        debug!("DELETE {}", path);
        self.execute(self.inner.delete(self.url(path)).query(query))
            .await
    }

    /// Execute a DELETE request with a JSON body.
    pub async fn delete_json(&self, path: &str, body: &serde_json::Value) -> PbResult<Response> {
        debug!("DELETE {}", path);
        self.execute(self.inner.delete(self.url(path)).json(body))
            .await
    }

    /// Execute a POST request with a multipart form (file uploads).
    /// Uses the extended timeout.
    pub async fn post_multipart(&self, path: &str, form: multipart::Form) -> PbResult<Response> {
        debug!("POST (multipart) {}", path);
        self.execute(
            self.inner
                .post(self.url(path))
                .multipart(form)
                .timeout(self.extended_timeout),
        )
        .await
    }

    /// Build a request with an arbitrary method (for the few endpoints that
    /// accept more than one).
    pub async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: &serde_json::Value,
    ) -> PbResult<Response> {
        debug!("{} {}", method, path);
        self.execute(self.inner.request(method, self.url(path)).json(body))
            .await
    }

    // --- Response helpers ---

    /// Deserialize a 2xx response body into the given type.
    pub async fn json<T: serde::de::DeserializeOwned>(response: Response) -> PbResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| PbError::Serialization(format!("failed to parse response: {e}")))
    }

    /// Get raw bytes from a response (file downloads).
    pub async fn bytes(response: Response) -> PbResult<Vec<u8>> {
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| PbError::Http(format!("failed to read response bytes: {e}")))
    }

    /// Read the server's error `detail` text from a non-2xx response.
    ///
    /// Falls back to the raw body when the JSON shape is unexpected.
    pub async fn detail(response: Response) -> String {
        let raw = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&raw) {
            Ok(body) if !body.detail.is_empty() => body.detail,
            _ => raw,
        }
    }

    /// Map a non-2xx response to the default error for its status code.
    ///
    /// Resource clients handle their endpoint-specific statuses first and
    /// fall back to this for everything else.
    pub async fn default_error(response: Response) -> PbError {
        let status = response.status().as_u16();
        let detail = Self::detail(response).await;
        default_error_for(status, detail)
    }

    /// Classify a reqwest error into a PbError variant.
    fn classify_error(e: reqwest::Error) -> PbError {
        if e.is_timeout() {
            PbError::Timeout(e.to_string())
        } else if e.is_connect() {
            PbError::Http(format!("connection failed: {e}"))
        } else {
            PbError::Http(e.to_string())
        }
    }
}

/// Default status-to-error mapping shared by every resource client.
///
/// The server reports bad tokens as 400 and missing privileges as 403
/// across the whole surface; anything else without a more specific
/// endpoint mapping becomes a ServerError.
pub(crate) fn default_error_for(status: u16, detail: String) -> PbError {
    match status {
        400 => PbError::BadAuthToken(detail),
        403 => PbError::NotAdminOrOwner(detail),
        _ => PbError::ServerError {
            status,
            message: detail,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_options() -> ClientOptions {
        ClientOptions::new("user1", "12345678")
    }

    #[test]
    fn test_url_building() {
        let client = ApiClient::new(&test_options(), None).unwrap();
        assert_eq!(client.api_root(), "http://127.0.0.1:7575/api/v1");
        assert_eq!(client.url("/users/list"), "http://127.0.0.1:7575/api/v1/users/list");
    }

    #[test]
    fn test_token_snapshot() {
        let client = ApiClient::new(&test_options(), Some("u-1.token")).unwrap();
        assert_eq!(client.auth_token(), "u-1.token");

        let client = ApiClient::new(&test_options(), None).unwrap();
        assert_eq!(client.auth_token(), "");
    }

    #[test]
    fn test_default_error_mapping() {
        assert!(matches!(
            default_error_for(400, "Invalid auth token".into()),
            PbError::BadAuthToken(_)
        ));
        assert!(matches!(
            default_error_for(403, "forbidden".into()),
            PbError::NotAdminOrOwner(_)
        ));
        assert!(matches!(
            default_error_for(500, "boom".into()),
            PbError::ServerError { status: 500, .. }
        ));
    }

    #[test]
    fn test_error_body_parsing() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail":"Invalid auth token"}"#).unwrap();
        assert_eq!(body.detail, "Invalid auth token");

        let body: ErrorBody = serde_json::from_str(r#"{}"#).unwrap();
        assert!(body.detail.is_empty());
    }
}
