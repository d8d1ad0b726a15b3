//! Device manager: connects devices, runs their workers, and tears them down.

use std::collections::BTreeMap;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use chrono::{DateTime, Local};
use log::info;

use crate::connection::{
    Connection, ConnectionSpec, ConnectionTimeouts, DeviceId, DEFAULT_READ_CHUNK_SIZE,
};
use crate::data::animation::AnimationStore;
use crate::error::DeviceError;
use crate::events::{DeviceEvent, EventController, EventFilter, EventKind};
use crate::registry::DeviceRegistry;
use crate::worker::{IngestionWorker, WorkerContext, WorkerState, DEFAULT_SAMPLING_INTERVAL};

/// Row shown in the device list.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub active: bool,
    pub state: WorkerState,
    pub connected_at: DateTime<Local>,
}

struct DeviceSlot {
    worker: IngestionWorker,
    connected_at: DateTime<Local>,
}

pub struct DeviceManager {
    registry: DeviceRegistry,
    store: AnimationStore,
    events: EventController,
    lost_rx: Receiver<DeviceEvent>,
    slots: BTreeMap<DeviceId, DeviceSlot>,
    interval: Duration,
    timeouts: ConnectionTimeouts,
    read_chunk_size: usize,
}

impl DeviceManager {
    pub fn new(store: AnimationStore, events: EventController) -> Self {
        let lost_rx = events.subscribe(EventFilter::only(EventKind::CONNECTION_LOST));
        Self {
            registry: DeviceRegistry::new(),
            store,
            events,
            lost_rx,
            slots: BTreeMap::new(),
            interval: DEFAULT_SAMPLING_INTERVAL,
            timeouts: ConnectionTimeouts::default(),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }

    /// Pause between two reads of every worker started afterwards.
    pub fn with_sampling_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeouts(mut self, timeouts: ConnectionTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_read_chunk_size(mut self, read_chunk_size: usize) -> Self {
        self.read_chunk_size = read_chunk_size;
        self
    }

    pub fn store(&self) -> &AnimationStore {
        &self.store
    }

    pub fn events(&self) -> &EventController {
        &self.events
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn sampling_interval(&self) -> Duration {
        self.interval
    }

    fn ensure_unique(&mut self, device_id: &DeviceId) -> Result<(), DeviceError> {
        // A device whose connection died may be connected again.
        self.poll_events();
        if self.slots.contains_key(device_id) || self.registry.contains(device_id) {
            return Err(DeviceError::DuplicateDevice(device_id.clone()));
        }
        Ok(())
    }

    /// Open a new device from user supplied parameters.
    ///
    /// Duplicates are rejected before any transport resource is allocated.
    pub fn connect(&mut self, spec: ConnectionSpec) -> Result<DeviceId, DeviceError> {
        self.ensure_unique(&spec.device_id())?;
        let connection = spec.build(self.timeouts, self.read_chunk_size);
        self.attach(connection)
    }

    /// Take over an existing connection: connect it if needed and start its worker.
    ///
    /// The device starts with plotting switched off.
    pub fn attach<C: Connection + 'static>(
        &mut self,
        mut connection: C,
    ) -> Result<DeviceId, DeviceError> {
        let device_id = connection.device_id().clone();
        self.ensure_unique(&device_id)?;

        if !connection.is_connected() && !connection.connect() {
            let detail = connection.last_error().unwrap_or_default().to_string();
            connection.close();
            return Err(DeviceError::ConnectFailed { device_id, detail });
        }

        let flag = self.registry.register(device_id.clone(), false)?;
        let mut worker = IngestionWorker::new(
            Box::new(connection),
            WorkerContext {
                store: self.store.clone(),
                flag,
                events: self.events.clone(),
                interval: self.interval,
            },
        );
        if let Err(e) = worker.start() {
            self.registry.remove(&device_id);
            return Err(e);
        }

        info!("device {} connected", device_id);
        self.slots.insert(
            device_id.clone(),
            DeviceSlot {
                worker,
                connected_at: Local::now(),
            },
        );
        self.events.emit(DeviceEvent::connected(&device_id));
        Ok(device_id)
    }

    /// Stop the device's worker (waiting for it) and forget the device.
    pub fn disconnect(&mut self, device_id: &DeviceId) -> Result<(), DeviceError> {
        let mut slot = self
            .slots
            .remove(device_id)
            .ok_or_else(|| DeviceError::UnknownDevice(device_id.clone()))?;
        self.registry.remove(device_id);
        slot.worker.stop();
        info!("device {} disconnected", device_id);
        self.events.emit(DeviceEvent::disconnected(device_id));
        Ok(())
    }

    pub fn set_active(&self, device_id: &DeviceId, active: bool) -> Result<(), DeviceError> {
        if self.registry.set_active(device_id, active) {
            Ok(())
        } else {
            Err(DeviceError::UnknownDevice(device_id.clone()))
        }
    }

    pub fn is_active(&self, device_id: &DeviceId) -> bool {
        self.registry.is_active(device_id)
    }

    pub fn contains(&self, device_id: &DeviceId) -> bool {
        self.slots.contains_key(device_id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn devices(&self) -> Vec<DeviceInfo> {
        self.slots
            .iter()
            .map(|(id, slot)| DeviceInfo {
                id: id.clone(),
                active: self.registry.is_active(id),
                state: slot.worker.state(),
                connected_at: slot.connected_at,
            })
            .collect()
    }

    /// Reap workers that reported a lost connection. Returns the ids that were removed.
    pub fn poll_events(&mut self) -> Vec<DeviceId> {
        let mut lost = Vec::new();
        while let Ok(event) = self.lost_rx.try_recv() {
            let Some(device_id) = event.device_id else {
                continue;
            };
            // Stale events of an id that was disconnected and connected again are skipped.
            let dead = self
                .slots
                .get(&device_id)
                .map(|slot| slot.worker.state() != WorkerState::Running)
                .unwrap_or(false);
            if !dead {
                continue;
            }
            if let Some(mut slot) = self.slots.remove(&device_id) {
                self.registry.remove(&device_id);
                slot.worker.stop();
                info!("removed lost device {}", device_id);
                lost.push(device_id);
            }
        }
        lost
    }

    /// Wipe all plotted data.
    pub fn clear_plot(&self) {
        self.store.clear();
        self.events.emit(DeviceEvent::store_cleared());
    }

    /// Stop and join every worker. Connections are closed by their workers on exit.
    pub fn shutdown(&mut self) {
        if self.slots.is_empty() {
            return;
        }
        info!("stopping {} ingestion worker(s)", self.slots.len());
        self.registry.clear();
        for (_, mut slot) in std::mem::take(&mut self.slots) {
            slot.worker.stop();
        }
    }
}

impl Drop for DeviceManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
