use crate::client::FppClient;
use crate::error::{FppError, Result};
use futures_util::{pin_mut, StreamExt};
use mdns::RecordKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};

/// mDNS service type announced by fppd
pub const SERVICE_TYPE: &str = "_fppd._udp.local";

const QUERY_INTERVAL: Duration = Duration::from_secs(15);
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(250);
const STOP_TIMEOUT: Duration = Duration::from_millis(500);

type DeviceMap = Arc<Mutex<BTreeMap<String, DiscoveredDevice>>>;

/// FPP device found on the local network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    /// Advertised server name, e.g. `fpp-stage.local`
    pub name: String,
    pub addresses: Vec<IpAddr>,
    /// Port of the announced fppd service
    pub port: Option<u16>,
}

impl DiscoveredDevice {
    /// Address to reach the device at, IPv4 preferred
    pub fn preferred_address(&self) -> Option<IpAddr> {
        self.addresses
            .iter()
            .find(|addr| addr.is_ipv4())
            .or_else(|| self.addresses.first())
            .copied()
    }

    /// Host string usable with [`FppClient::new`]
    pub fn host(&self) -> Option<String> {
        self.preferred_address().map(|addr| match addr {
            IpAddr::V4(v4) => v4.to_string(),
            IpAddr::V6(v6) => format!("[{}]", v6),
        })
    }

    /// Create a client for this device
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fpp_client::Discovery;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let mut discovery = Discovery::new();
    ///     discovery.start().await?;
    ///
    ///     tokio::time::sleep(tokio::time::Duration::from_secs(3)).await;
    ///
    ///     if let Some(mut fpp) = discovery.devices().first().and_then(|d| d.client()) {
    ///         let device = fpp.update().await?;
    ///         println!("{}", device.read().system_status.status_name());
    ///     }
    ///
    ///     discovery.stop().await;
    ///     Ok(())
    /// }
    /// ```
    pub fn client(&self) -> Option<FppClient> {
        self.host().map(FppClient::new)
    }
}

/// Discovery manager for FPP devices
///
/// Browses the local network for the fppd mDNS service on a background thread
/// and keeps a list of the devices seen so far. The list survives
/// [`stop`](Discovery::stop) and restarts.
///
/// # Example
///
/// ```no_run
/// use fpp_client::Discovery;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut discovery = Discovery::new();
///     let mut found = discovery.subscribe_updates();
///     discovery.start().await?;
///
///     while let Ok(name) = found.recv().await {
///         println!("Found {}", name);
///     }
///     Ok(())
/// }
/// ```
pub struct Discovery {
    devices: DeviceMap,
    update_tx: broadcast::Sender<String>,
    stop_flag: Option<Arc<AtomicBool>>,
    thread: Option<JoinHandle<()>>,
}

impl Discovery {
    /// Create a new Discovery manager
    pub fn new() -> Self {
        let (update_tx, _) = broadcast::channel(100);
        Self {
            devices: Arc::new(Mutex::new(BTreeMap::new())),
            update_tx,
            stop_flag: None,
            thread: None,
        }
    }

    /// Subscribe to discovery events
    ///
    /// The receiver gets a device name each time a new device is found.
    pub fn subscribe_updates(&self) -> broadcast::Receiver<String> {
        self.update_tx.subscribe()
    }

    /// Get a snapshot of the devices found so far
    pub fn devices(&self) -> Vec<DiscoveredDevice> {
        let devices = self.devices.lock().unwrap_or_else(PoisonError::into_inner);
        devices.values().cloned().collect()
    }

    /// Get the number of devices found so far
    pub fn device_count(&self) -> usize {
        self.devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Forget all devices found so far
    pub fn clear_devices(&self) {
        self.devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Whether a browse is running
    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Start browsing
    ///
    /// A browse already running is stopped first. Fails if the mDNS socket
    /// cannot be opened.
    pub async fn start(&mut self) -> Result<()> {
        self.stop().await;

        let stop_flag = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = oneshot::channel();

        let devices = self.devices.clone();
        let update_tx = self.update_tx.clone();
        let thread_stop = stop_flag.clone();

        let thread = std::thread::Builder::new()
            .name("fpp-discovery".into())
            .spawn(move || {
                async_std::task::block_on(browse(devices, update_tx, thread_stop, ready_tx));
            })
            .map_err(|e| FppError::Generic {
                message: format!("Failed to spawn discovery thread: {}", e),
            })?;

        self.stop_flag = Some(stop_flag);
        self.thread = Some(thread);

        match ready_rx.await {
            Ok(Ok(())) => {
                tracing::info!("Browsing for {} services", SERVICE_TYPE);
                Ok(())
            }
            Ok(Err(message)) => {
                self.stop().await;
                Err(FppError::Connection {
                    message: format!("Failed to start mDNS discovery: {}", message),
                    source: None,
                })
            }
            Err(_) => {
                self.stop().await;
                Err(FppError::Generic {
                    message: "Discovery thread exited during startup".into(),
                })
            }
        }
    }

    /// Stop browsing
    ///
    /// The device list is preserved.
    pub async fn stop(&mut self) {
        if let Some(flag) = self.stop_flag.take() {
            flag.store(true, Ordering::SeqCst);
        }
        if let Some(thread) = self.thread.take() {
            let join = tokio::task::spawn_blocking(move || thread.join());
            if tokio::time::timeout(STOP_TIMEOUT + STOP_POLL_INTERVAL, join)
                .await
                .is_err()
            {
                tracing::warn!("Discovery thread did not stop in time");
            } else {
                tracing::info!("Discovery stopped");
            }
        }
    }
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Discovery {
    fn drop(&mut self) {
        if let Some(flag) = &self.stop_flag {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

async fn browse(
    devices: DeviceMap,
    update_tx: broadcast::Sender<String>,
    stop: Arc<AtomicBool>,
    ready_tx: oneshot::Sender<std::result::Result<(), String>>,
) {
    let discovery = match mdns::discover::all(SERVICE_TYPE, QUERY_INTERVAL) {
        Ok(discovery) => {
            let _ = ready_tx.send(Ok(()));
            discovery
        }
        Err(e) => {
            let _ = ready_tx.send(Err(e.to_string()));
            return;
        }
    };

    let stream = discovery.listen();
    pin_mut!(stream);

    while !stop.load(Ordering::SeqCst) {
        match async_std::future::timeout(STOP_POLL_INTERVAL, stream.next()).await {
            Ok(Some(Ok(response))) => {
                match device_from_records(response.records().map(|r| &r.kind)) {
                    Some(device) => record_device(&devices, &update_tx, device),
                    None => tracing::debug!("Ignoring mDNS response without addresses"),
                }
            }
            Ok(Some(Err(e))) => tracing::warn!("mDNS error: {}", e),
            Ok(None) => {
                tracing::info!("mDNS stream ended");
                break;
            }
            Err(_) => {}
        }
    }
}

/// Build a device from the records of one mDNS response
///
/// The name comes from the SRV target, falling back to the PTR instance name.
/// Responses without any A/AAAA record are dropped.
fn device_from_records<'a>(records: impl Iterator<Item = &'a RecordKind>) -> Option<DiscoveredDevice> {
    let mut server = None;
    let mut instance = None;
    let mut port = None;
    let mut addresses = Vec::new();

    for kind in records {
        match kind {
            RecordKind::A(addr) => addresses.push(IpAddr::V4(*addr)),
            RecordKind::AAAA(addr) => addresses.push(IpAddr::V6(*addr)),
            RecordKind::SRV {
                port: srv_port,
                target,
                ..
            } => {
                server.get_or_insert_with(|| target.clone());
                port.get_or_insert(*srv_port);
            }
            RecordKind::PTR(name) => {
                instance.get_or_insert_with(|| name.clone());
            }
            _ => {}
        }
    }

    if addresses.is_empty() {
        return None;
    }
    addresses.dedup();

    let name = server
        .or(instance)
        .map(|name| name.trim_end_matches('.').to_string())
        .or_else(|| addresses.first().map(|addr| addr.to_string()))?;

    Some(DiscoveredDevice {
        name,
        addresses,
        port,
    })
}

/// Insert or merge a device; announce it if it was not known yet
fn record_device(devices: &DeviceMap, update_tx: &broadcast::Sender<String>, device: DiscoveredDevice) {
    let mut devices = devices.lock().unwrap_or_else(PoisonError::into_inner);
    match devices.get_mut(&device.name) {
        Some(known) => {
            for addr in device.addresses {
                if !known.addresses.contains(&addr) {
                    known.addresses.push(addr);
                }
            }
            if known.port.is_none() {
                known.port = device.port;
            }
        }
        None => {
            tracing::info!("Found FPP device {} at {:?}", device.name, device.addresses);
            let name = device.name.clone();
            devices.insert(name.clone(), device);
            let _ = update_tx.send(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn srv(target: &str) -> RecordKind {
        RecordKind::SRV {
            priority: 0,
            weight: 0,
            port: 32320,
            target: target.into(),
        }
    }

    #[test]
    fn device_is_named_after_srv_target() {
        let records = [
            RecordKind::PTR("FPP Stage._fppd._udp.local".into()),
            srv("fpp-stage.local."),
            RecordKind::A(Ipv4Addr::new(192, 168, 1, 50)),
        ];

        let device = device_from_records(records.iter()).unwrap();

        assert_eq!(device.name, "fpp-stage.local");
        assert_eq!(device.port, Some(32320));
        assert_eq!(device.host().as_deref(), Some("192.168.1.50"));
    }

    #[test]
    fn responses_without_addresses_are_dropped() {
        let records = [srv("fpp.local.")];
        assert!(device_from_records(records.iter()).is_none());
    }

    #[test]
    fn ipv4_is_preferred_and_ipv6_is_bracketed() {
        let v6 = Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1);
        let device = DiscoveredDevice {
            name: "fpp".into(),
            addresses: vec![IpAddr::V6(v6), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7))],
            port: None,
        };
        assert_eq!(device.host().as_deref(), Some("10.0.0.7"));

        let device = DiscoveredDevice {
            addresses: vec![IpAddr::V6(v6)],
            ..device
        };
        assert_eq!(device.host().as_deref(), Some("[fe80::1]"));
        assert_eq!(device.client().unwrap().host(), "[fe80::1]");
    }

    #[test]
    fn repeated_announcements_merge() {
        let discovery = Discovery::new();
        let mut updates = discovery.subscribe_updates();

        let first = DiscoveredDevice {
            name: "fpp.local".into(),
            addresses: vec![IpAddr::V4(Ipv4Addr::new(192, 168, 1, 50))],
            port: None,
        };
        let second = DiscoveredDevice {
            addresses: vec![
                IpAddr::V4(Ipv4Addr::new(192, 168, 1, 50)),
                IpAddr::V4(Ipv4Addr::new(10, 0, 0, 50)),
            ],
            port: Some(32320),
            ..first.clone()
        };

        record_device(&discovery.devices, &discovery.update_tx, first);
        record_device(&discovery.devices, &discovery.update_tx, second);

        assert_eq!(discovery.device_count(), 1);
        let device = &discovery.devices()[0];
        assert_eq!(device.addresses.len(), 2);
        assert_eq!(device.port, Some(32320));

        assert_eq!(updates.try_recv().unwrap(), "fpp.local");
        assert!(updates.try_recv().is_err());

        discovery.clear_devices();
        assert_eq!(discovery.device_count(), 0);
    }
}
