//! Which devices are connected and which of them are plotted.
//!
//! Each connected device owns one [`ActivityFlag`]. The UI writes it through the registry,
//! the device's ingestion worker holds a clone and reads it once per loop iteration. Workers
//! never look their flag up by id, so removing or re-adding an id cannot hand a worker
//! someone else's flag.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::connection::DeviceId;
use crate::error::DeviceError;

/// Shared "should render" boolean of one device.
#[derive(Debug, Clone, Default)]
pub struct ActivityFlag(Arc<AtomicBool>);

impl ActivityFlag {
    pub fn new(active: bool) -> Self {
        Self(Arc::new(AtomicBool::new(active)))
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, active: bool) {
        self.0.store(active, Ordering::Relaxed);
    }
}

/// Registry of live devices and their activity flags.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    flags: Arc<RwLock<BTreeMap<DeviceId, ActivityFlag>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device. Fails if the id is already registered.
    pub fn register(&self, device_id: DeviceId, active: bool) -> Result<ActivityFlag, DeviceError> {
        let mut flags = self.flags.write().unwrap_or_else(PoisonError::into_inner);
        if flags.contains_key(&device_id) {
            return Err(DeviceError::DuplicateDevice(device_id));
        }
        let flag = ActivityFlag::new(active);
        flags.insert(device_id, flag.clone());
        Ok(flag)
    }

    /// Toggle plotting for a device. Returns `false` for unknown ids.
    pub fn set_active(&self, device_id: &DeviceId, active: bool) -> bool {
        let flags = self.flags.read().unwrap_or_else(PoisonError::into_inner);
        match flags.get(device_id) {
            Some(flag) => {
                flag.set(active);
                true
            }
            None => false,
        }
    }

    /// Unknown ids are reported as inactive.
    pub fn is_active(&self, device_id: &DeviceId) -> bool {
        let flags = self.flags.read().unwrap_or_else(PoisonError::into_inner);
        flags.get(device_id).map(ActivityFlag::get).unwrap_or(false)
    }

    /// Forget a device. Its flag is also switched off so a worker still holding it stops
    /// forwarding samples.
    pub fn remove(&self, device_id: &DeviceId) -> bool {
        let mut flags = self.flags.write().unwrap_or_else(PoisonError::into_inner);
        match flags.remove(device_id) {
            Some(flag) => {
                flag.set(false);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, device_id: &DeviceId) -> bool {
        let flags = self.flags.read().unwrap_or_else(PoisonError::into_inner);
        flags.contains_key(device_id)
    }

    pub fn len(&self) -> usize {
        self.flags.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut flags = self.flags.write().unwrap_or_else(PoisonError::into_inner);
        for flag in flags.values() {
            flag.set(false);
        }
        flags.clear();
    }
}
