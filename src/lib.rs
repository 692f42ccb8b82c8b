//! Rust library for reading the state of Falcon Player (FPP) show controllers
//!
//! FPP exposes a plain HTTP JSON API. This library provides an async client
//! for it. It supports:
//!
//! - Fetching system status, playlists and sequences into a typed [`Device`]
//! - Refreshing that snapshot in place with [`FppClient::update`]
//! - Raw requests against any API path with typed error reporting
//! - Discovery of devices on the local network via mDNS
//!
//! # Quick Start
//!
//! ```no_run
//! use fpp_client::FppClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut fpp = FppClient::new("192.168.1.50");
//!
//!     let device = fpp.update().await?;
//!     println!("fppd is {}", device.read().system_status.fppd());
//!
//!     // Later updates refresh the same snapshot
//!     fpp.update().await?;
//!     println!("volume is now {}", device.read().system_status.volume());
//!
//!     fpp.close();
//!     Ok(())
//! }
//! ```
//!
//! # Errors
//!
//! Failures are reported as [`FppError`]. Its variants form a small
//! hierarchy, so a caller can handle a whole family at once:
//!
//! ```no_run
//! use fpp_client::{ErrorKind, FppClient};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut fpp = FppClient::new("fpp.local");
//! match fpp.update().await {
//!     Ok(_) => {}
//!     // Timeouts and closed connections are connection errors too
//!     Err(e) if e.is(ErrorKind::Connection) => eprintln!("device unreachable: {}", e),
//!     Err(e) => eprintln!("update failed: {}", e),
//! }
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Client**: [`FppClient`], fetches the three endpoints and owns the snapshot
//! - **Device**: [`DeviceHandle`], shared view of the snapshot
//! - **Connection**: HTTP transport, timeouts, retry with exponential backoff
//! - **Payload**: normalization and decoding of raw JSON bodies
//! - **Types**: domain records mirroring the device's JSON
//! - **Discovery**: mDNS browsing for `_fppd._udp.local` services

mod client;
mod connection;
mod device;
mod discovery;
mod error;
pub mod payload;
mod types;

// Public exports
pub use client::{FppClient, FppClientBuilder};
pub use connection::{
    Connection, ConnectionConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_RETRY_BACKOFF,
};
pub use device::DeviceHandle;
pub use discovery::{DiscoveredDevice, Discovery, SERVICE_TYPE};
pub use error::{ErrorKind, FppError, Result};
pub use reqwest::Method;
pub use types::{
    CurrentPlaylist, Device, DeviceUpdate, MqttStatus, NextPlaylist, Playlist, PlaylistItem,
    Sequence, SystemStatus, SystemStatusAdvanceView, SystemStatusAdvanceViewUtilization,
};
