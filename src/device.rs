use crate::types::{Device, DeviceUpdate};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

/// Shared handle to the device snapshot held by an [`FppClient`](crate::FppClient)
///
/// Every successful [`update`](crate::FppClient::update) after the first one
/// modifies the same snapshot in place, so a handle obtained earlier always
/// sees the latest state. Cloning a handle is cheap; all clones point at the
/// same snapshot.
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    inner: Arc<RwLock<Device>>,
}

impl DeviceHandle {
    pub(crate) fn new(device: Device) -> Self {
        Self {
            inner: Arc::new(RwLock::new(device)),
        }
    }

    /// Get a copy of the current snapshot
    pub fn snapshot(&self) -> Device {
        self.read().clone()
    }

    /// Borrow the current snapshot
    ///
    /// Do not hold the guard across an `update()` of the owning client.
    pub fn read(&self) -> RwLockReadGuard<'_, Device> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether both handles point at the same snapshot
    pub fn ptr_eq(&self, other: &DeviceHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn apply(&self, update: DeviceUpdate) {
        let mut device = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        device.apply(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Sequence, SystemStatus};

    #[test]
    fn clones_observe_updates() {
        let handle = DeviceHandle::new(Device::default());
        let earlier = handle.clone();

        handle.apply(DeviceUpdate {
            system_status: Some(SystemStatus {
                volume: Some(65),
                ..SystemStatus::default()
            }),
            playlists: None,
            sequences: Some(vec![Sequence {
                name: "intro".into(),
            }]),
        });

        assert!(earlier.ptr_eq(&handle));
        assert_eq!(earlier.read().system_status.volume(), 65);
        assert_eq!(earlier.snapshot().sequence_names(), vec!["intro"]);
    }

    #[test]
    fn snapshots_are_detached() {
        let handle = DeviceHandle::new(Device::default());
        let before = handle.snapshot();

        handle.apply(DeviceUpdate {
            system_status: Some(SystemStatus {
                volume: Some(12),
                ..SystemStatus::default()
            }),
            ..DeviceUpdate::default()
        });

        assert_eq!(before.system_status.volume(), 0);
        assert_eq!(handle.snapshot().system_status.volume(), 12);
    }

    #[test]
    fn distinct_handles_are_not_equal() {
        let a = DeviceHandle::new(Device::default());
        let b = DeviceHandle::new(Device::default());
        assert!(!a.ptr_eq(&b));
    }
}
