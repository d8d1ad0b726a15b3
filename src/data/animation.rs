//! Shared rolling buffers of recent samples, one per device.
//!
//! Ingestion workers append through [`AnimationStore::update`]; the render tick reads through
//! [`AnimationStore::snapshot`] and records the line it created with
//! [`AnimationStore::set_line_handle`]. A single coarse mutex guards the map and is held only
//! for the append-and-trim or for cloning `Arc`s, never across I/O or drawing.
//!
//! Sample buffers are reference counted: a snapshot shares them with the store, and the next
//! append copies the buffer if a reader still holds the old one (`Arc::make_mut`). A reader
//! therefore always sees a complete append or none of it.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::connection::DeviceId;
use crate::data::sample::Sample;
use crate::render::LineHandle;

/// Default number of samples retained per device.
pub const DEFAULT_MAX_POINTS: usize = 100;

#[derive(Debug, Clone)]
struct AnimationEntry {
    samples: Arc<VecDeque<Sample>>,
    line: Option<LineHandle>,
    revision: u64,
}

impl AnimationEntry {
    fn new() -> Self {
        Self {
            samples: Arc::new(VecDeque::new()),
            line: None,
            revision: 0,
        }
    }

    fn prune_by_points(&mut self, max_points: usize) -> bool {
        if self.samples.len() <= max_points {
            return false;
        }
        let buf = Arc::make_mut(&mut self.samples);
        while buf.len() > max_points {
            buf.pop_front();
        }
        true
    }
}

struct StoreInner {
    entries: BTreeMap<DeviceId, AnimationEntry>,
    max_points: usize,
    // Incremented by `clear`; line handles from an older epoch are stale.
    epoch: u64,
}

/// Cloneable handle to the shared store.
#[derive(Clone)]
pub struct AnimationStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl AnimationStore {
    pub fn new(max_points: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                entries: BTreeMap::new(),
                max_points: max_points.max(1),
                epoch: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append samples to a device's buffer, creating the entry on first use, and keep only
    /// the most recent `max_points`. An empty batch does nothing.
    pub fn update(&self, device_id: &DeviceId, samples: &[Sample]) {
        if samples.is_empty() {
            return;
        }
        let mut inner = self.lock();
        let max_points = inner.max_points;
        let entry = inner
            .entries
            .entry(device_id.clone())
            .or_insert_with(AnimationEntry::new);
        let buf = Arc::make_mut(&mut entry.samples);
        // Only the tail can survive the trim.
        let skip = samples.len().saturating_sub(max_points);
        buf.extend(samples[skip..].iter().copied());
        while buf.len() > max_points {
            buf.pop_front();
        }
        entry.revision += 1;
    }

    /// Read-only view of every entry.
    pub fn snapshot(&self) -> StoreSnapshot {
        let inner = self.lock();
        StoreSnapshot {
            epoch: inner.epoch,
            entries: inner
                .entries
                .iter()
                .map(|(id, e)| EntrySnapshot {
                    device_id: id.clone(),
                    samples: Arc::clone(&e.samples),
                    line: e.line,
                    revision: e.revision,
                })
                .collect(),
        }
    }

    /// Drop every entry. Line handles cached before the clear are invalidated.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.epoch += 1;
    }

    /// Remember the line drawn for `device_id`. Ignored if the store was cleared since the
    /// snapshot with `epoch` was taken, or if the entry no longer exists.
    pub fn set_line_handle(&self, device_id: &DeviceId, handle: LineHandle, epoch: u64) -> bool {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            return false;
        }
        match inner.entries.get_mut(device_id) {
            Some(entry) => {
                entry.line = Some(handle);
                true
            }
            None => false,
        }
    }

    pub fn line_handle(&self, device_id: &DeviceId) -> Option<LineHandle> {
        self.lock().entries.get(device_id).and_then(|e| e.line)
    }

    /// Copy of one device's buffer, oldest first.
    pub fn samples(&self, device_id: &DeviceId) -> Option<Vec<Sample>> {
        self.lock()
            .entries
            .get(device_id)
            .map(|e| e.samples.iter().copied().collect())
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    pub fn max_points(&self) -> usize {
        self.lock().max_points
    }

    /// Change the cap and trim existing buffers to it.
    pub fn set_max_points(&self, max_points: usize) {
        let mut inner = self.lock();
        let max_points = max_points.max(1);
        inner.max_points = max_points;
        for entry in inner.entries.values_mut() {
            if entry.prune_by_points(max_points) {
                entry.revision += 1;
            }
        }
    }
}

impl Default for AnimationStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POINTS)
    }
}

/// One entry as seen by the render tick.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySnapshot {
    pub device_id: DeviceId,
    pub samples: Arc<VecDeque<Sample>>,
    pub line: Option<LineHandle>,
    /// Bumped on every mutation of the samples; lets readers skip unchanged entries.
    pub revision: u64,
}

impl EntrySnapshot {
    pub fn xs(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.x).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.y).collect()
    }

    pub fn points(&self) -> Vec<[f64; 2]> {
        self.samples.iter().map(Sample::as_point).collect()
    }
}

/// Every entry at one instant, ordered by device id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreSnapshot {
    pub epoch: u64,
    pub entries: Vec<EntrySnapshot>,
}

impl StoreSnapshot {
    pub fn get(&self, device_id: &DeviceId) -> Option<&EntrySnapshot> {
        self.entries.iter().find(|e| &e.device_id == device_id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
