use crate::connection::{Connection, ConnectionConfig};
use crate::device::DeviceHandle;
use crate::error::{FppError, Result};
use crate::payload::{self, PLAYLISTS, SEQUENCES, SYSTEM_STATUS};
use reqwest::Method;
use serde_json::{Map, Value};
use std::time::Duration;

const SYSTEM_STATUS_PATH: &str = "/api/system/status";
const PLAYLISTS_PATH: &str = "/api/playlists";
const SEQUENCES_PATH: &str = "/api/sequence";

/// Client for reading the state of an FPP device
///
/// The client keeps a [`Device`](crate::Device) snapshot, created by the first
/// successful [`update`](FppClient::update) and refreshed in place by later
/// ones.
///
/// An HTTP session created by the client is released when the client is
/// dropped or [`close`](FppClient::close)d. A session passed in through
/// [`FppClientBuilder::http_client`] is never closed by the client.
///
/// Calls take `&mut self`: one `update()` runs at a time per client.
///
/// # Example
///
/// ```no_run
/// use fpp_client::FppClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut fpp = FppClient::new("192.168.1.50");
///     let handle = fpp.update().await?;
///
///     let device = handle.read();
///     let status = &device.system_status;
///     println!("{} ({}), volume {}", status.fppd(), status.mode_name(), status.volume());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FppClient {
    connection: Connection,
    device: Option<DeviceHandle>,
}

/// Builder for [`FppClient`]
#[derive(Debug)]
pub struct FppClientBuilder {
    host: String,
    config: ConnectionConfig,
    http: Option<reqwest::Client>,
}

impl FppClientBuilder {
    /// Deadline for each request (default 8 seconds)
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Base delay between retries of a failed connection (default 1 second)
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.config.retry_backoff = backoff;
        self
    }

    /// Attempts per request on connection errors (default 3, minimum 1)
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts.max(1);
        self
    }

    /// Use an existing HTTP client instead of creating one
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the client
    pub fn build(self) -> FppClient {
        FppClient {
            connection: Connection::new(self.host, self.config, self.http),
            device: None,
        }
    }
}

impl FppClient {
    /// Create a client for the device at `host` with default settings
    ///
    /// `host` is an IP address or DNS name, optionally followed by `:port`.
    pub fn new(host: impl Into<String>) -> Self {
        Self::builder(host).build()
    }

    /// Start configuring a client for the device at `host`
    pub fn builder(host: impl Into<String>) -> FppClientBuilder {
        FppClientBuilder {
            host: host.into(),
            config: ConnectionConfig::default(),
            http: None,
        }
    }

    /// Get the device host
    pub fn host(&self) -> &str {
        self.connection.host()
    }

    /// Get the underlying connection
    pub fn connection(&mut self) -> &mut Connection {
        &mut self.connection
    }

    /// Handle to the current snapshot, if an update has succeeded before
    pub fn device(&self) -> Option<DeviceHandle> {
        self.device.clone()
    }

    /// Send a raw request to the device
    ///
    /// See [`Connection::request`].
    pub async fn request(
        &mut self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value> {
        self.connection.request(path, method, body).await
    }

    /// Fetch system status, playlists and sequences and refresh the snapshot
    ///
    /// The three requests run one after the other. If any of them returns an
    /// empty body, [`FppError::EmptyResponse`] is returned right away, the
    /// remaining requests are skipped and the snapshot is left untouched.
    ///
    /// The first successful call creates the snapshot. Later calls replace
    /// each of its three parts with the freshly fetched one, and return a
    /// handle to the same snapshot.
    pub async fn update(&mut self) -> Result<DeviceHandle> {
        let mut payload = Map::new();
        payload.insert(
            SYSTEM_STATUS.to_string(),
            self.fetch(SYSTEM_STATUS_PATH, "system_status").await?,
        );
        payload.insert(
            PLAYLISTS.to_string(),
            self.fetch(PLAYLISTS_PATH, "playlist").await?,
        );
        payload.insert(
            SEQUENCES.to_string(),
            self.fetch(SEQUENCES_PATH, "sequences").await?,
        );

        match &self.device {
            Some(handle) => {
                let update = payload::decode_update(payload)?;
                handle.apply(update);
                tracing::debug!("Updated device snapshot for {}", self.host());
                Ok(handle.clone())
            }
            None => {
                let device = payload::decode_device(payload)?;
                let handle = DeviceHandle::new(device);
                self.device = Some(handle.clone());
                tracing::info!("Created device snapshot for {}", self.host());
                Ok(handle)
            }
        }
    }

    /// Release the HTTP session if the client created it
    pub fn close(&mut self) {
        self.connection.close();
    }

    async fn fetch(&mut self, path: &str, what: &str) -> Result<Value> {
        let value = self.connection.get(path).await?;
        if payload::is_empty(&value) {
            return Err(FppError::EmptyResponse {
                message: format!(
                    "FPP device at {} returned an empty API response on {} update",
                    self.host(),
                    what
                ),
            });
        }
        Ok(value)
    }
}
