use crate::error::{FppError, Result};
use crate::payload;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::{sleep, timeout};

const ACCEPT_VALUE: &str = "application/json, text/plain, */*";

/// Default per-request deadline
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(8);
/// Default delay before the first retry; doubled for each further retry
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);
/// Default number of attempts per request, the first one included
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Transport settings
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Deadline for a single attempt (sending the request and reading the body)
    pub request_timeout: Duration,
    /// Base delay of the exponential backoff between attempts
    pub retry_backoff: Duration,
    /// Total attempts for a request failing with a connection error
    pub max_attempts: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Plain HTTP connection to one FPP device
///
/// Requests go to `http://{host}{path}`; `host` may carry a port
/// (`"192.168.1.50:8080"`), otherwise port 80 is used.
///
/// If no `reqwest::Client` was supplied, one is created on the first request
/// and owned by this connection. [`close`](Connection::close) releases an
/// owned client and leaves a supplied one untouched.
///
/// A connection serves one request at a time (`&mut self`); share it between
/// tasks only behind your own synchronization.
#[derive(Debug)]
pub struct Connection {
    host: String,
    config: ConnectionConfig,
    http: Option<reqwest::Client>,
    owns_http: bool,
}

impl Connection {
    /// Create a connection to `host`, optionally over a caller-supplied client
    pub fn new(
        host: impl Into<String>,
        config: ConnectionConfig,
        http: Option<reqwest::Client>,
    ) -> Self {
        let owns_http = http.is_none();
        Self {
            host: host.into(),
            config,
            http,
            owns_http,
        }
    }

    /// Get the device host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Get the transport settings
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Whether an HTTP client is currently held
    pub fn is_open(&self) -> bool {
        self.http.is_some()
    }

    /// Whether the HTTP client was created (and will be released) by this connection
    pub fn owns_http_client(&self) -> bool {
        self.owns_http
    }

    /// Release the HTTP client if this connection created it
    ///
    /// A later request lazily creates a fresh one.
    pub fn close(&mut self) {
        if self.owns_http && self.http.take().is_some() {
            tracing::info!("Closed HTTP session for FPP device at {}", self.host);
        }
    }

    /// Send a request to the device and return its body
    ///
    /// JSON responses are decoded; any other content type is returned as a
    /// `Value::String` holding the raw text. An empty JSON body yields
    /// `Value::Null`.
    ///
    /// Connection failures are retried with exponential backoff, up to
    /// [`ConnectionConfig::max_attempts`] attempts. Timeouts and HTTP error
    /// statuses are not retried.
    pub async fn request(
        &mut self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.url(path)?;
        let http = self.http_client()?;

        let mut delay = self.config.retry_backoff;
        let mut attempt = 1;
        loop {
            match self.send_once(&http, url.clone(), method.clone(), body).await {
                Err(e) if e.is_retryable() && attempt < self.config.max_attempts => {
                    tracing::warn!(
                        "Attempt {}/{} to {} failed: {}; retrying in {:?}",
                        attempt,
                        self.config.max_attempts,
                        url,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Send a `GET` request
    pub async fn get(&mut self, path: &str) -> Result<Value> {
        self.request(path, Method::GET, None).await
    }

    /// Send a `GET` request and decode the body into `T`
    pub async fn get_json<T: DeserializeOwned>(&mut self, path: &str) -> Result<T> {
        let value = self.get(path).await?;
        payload::decode(path, value)
    }

    fn url(&self, path: &str) -> Result<Url> {
        let separator = if path.starts_with('/') { "" } else { "/" };
        let raw = format!("http://{}{}{}", self.host, separator, path);
        Url::parse(&raw).map_err(|e| FppError::Connection {
            message: format!("Invalid address for FPP device at {}: {}", self.host, e),
            source: None,
        })
    }

    fn http_client(&mut self) -> Result<reqwest::Client> {
        if let Some(http) = &self.http {
            return Ok(http.clone());
        }

        tracing::info!("Opening HTTP session for FPP device at {}", self.host);
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| self.connection_error(e))?;
        self.http = Some(http.clone());
        Ok(http)
    }

    async fn send_once(
        &self,
        http: &reqwest::Client,
        url: Url,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value> {
        tracing::debug!("{} {}", method, url);

        let mut request = http.request(method, url).header(ACCEPT, ACCEPT_VALUE);
        if let Some(body) = body {
            request = request.json(body);
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, content_type, text))
        };

        let (status, content_type, text) = match timeout(self.config.request_timeout, exchange).await
        {
            Ok(Ok(parts)) => parts,
            Ok(Err(e)) if e.is_timeout() => return Err(self.timeout_error()),
            Ok(Err(e)) => return Err(self.connection_error(e)),
            Err(_) => return Err(self.timeout_error()),
        };

        tracing::debug!("Received HTTP {} ({}) from {}", status, content_type, self.host);

        let is_json = content_type.contains("application/json");
        if status.is_client_error() || status.is_server_error() {
            return Err(http_error(status, is_json, text));
        }

        if !is_json {
            return Ok(Value::String(text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|source| FppError::Decode {
            entity: format!("response from {}", self.host),
            source,
        })
    }

    fn timeout_error(&self) -> FppError {
        FppError::ConnectionTimeout {
            message: format!(
                "Timeout occurred while connecting to FPP device at {}",
                self.host
            ),
        }
    }

    fn connection_error(&self, source: reqwest::Error) -> FppError {
        FppError::Connection {
            message: format!(
                "Error occurred while communicating with FPP device at {}",
                self.host
            ),
            source: Some(source),
        }
    }
}

fn http_error(status: StatusCode, is_json: bool, text: String) -> FppError {
    let body = if is_json {
        serde_json::from_str(&text).unwrap_or_else(|_| json!({ "message": text }))
    } else {
        json!({ "message": text })
    };
    FppError::Http {
        status: status.as_u16(),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_host_and_path() {
        let conn = Connection::new("192.168.1.50", ConnectionConfig::default(), None);
        assert_eq!(
            conn.url("/api/system/status").unwrap().as_str(),
            "http://192.168.1.50/api/system/status"
        );
        assert_eq!(
            conn.url("api/playlists").unwrap().as_str(),
            "http://192.168.1.50/api/playlists"
        );

        let conn = Connection::new("fpp.local:8080", ConnectionConfig::default(), None);
        assert_eq!(
            conn.url("/api/sequence").unwrap().as_str(),
            "http://fpp.local:8080/api/sequence"
        );
    }

    #[test]
    fn invalid_host_is_a_connection_error() {
        let conn = Connection::new("bad host", ConnectionConfig::default(), None);
        let err = conn.url("/api/sequence").unwrap_err();
        assert!(matches!(err, FppError::Connection { .. }));
        assert!(err.to_string().contains("bad host"));
    }

    #[test]
    fn non_json_error_body_is_wrapped() {
        let err = http_error(StatusCode::NOT_FOUND, false, "Not Found".into());
        match err {
            FppError::Http { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, json!({"message": "Not Found"}));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_json_error_body_falls_back_to_text() {
        let err = http_error(StatusCode::INTERNAL_SERVER_ERROR, true, "oops{".into());
        assert!(matches!(err, FppError::Http { status: 500, ref body } if body["message"] == "oops{"));
    }

    #[test]
    fn supplied_client_survives_close() {
        let mut conn = Connection::new(
            "fpp.local",
            ConnectionConfig::default(),
            Some(reqwest::Client::new()),
        );
        assert!(!conn.owns_http_client());
        conn.close();
        assert!(conn.is_open());
    }

    #[test]
    fn owned_client_is_created_lazily_and_released() {
        let mut conn = Connection::new("fpp.local", ConnectionConfig::default(), None);
        assert!(conn.owns_http_client());
        assert!(!conn.is_open());

        conn.http_client().unwrap();
        assert!(conn.is_open());

        conn.close();
        assert!(!conn.is_open());
    }
}
