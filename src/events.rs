//! Device lifecycle events.
//!
//! Workers run on their own threads and must not call into the UI. Instead they emit a
//! [`DeviceEvent`] through an [`EventController`]; subscribers (the device manager, the UI)
//! drain their `mpsc` receivers on their own schedule.
//!
//! Each event carries a set of [`EventKind`] flags. A subscriber passes an [`EventFilter`]
//! and receives an event when `(event.kinds & filter) != 0`.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::connection::DeviceId;

// ─────────────────────────────────────────────────────────────────────────────
// EventKind – bitflags
// ─────────────────────────────────────────────────────────────────────────────

/// Bitflags describing the categories an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventKind(pub u64);

impl EventKind {
    /// A device connected and its worker started.
    pub const CONNECTED: Self = Self(1 << 0);
    /// A device was disconnected on request.
    pub const DISCONNECTED: Self = Self(1 << 1);
    /// A worker found its connection dead and stopped.
    pub const CONNECTION_LOST: Self = Self(1 << 2);
    /// The animation store was wiped.
    pub const STORE_CLEARED: Self = Self(1 << 3);

    /// Wildcard: matches every event kind.
    pub const ALL: Self = Self(u64::MAX);

    /// Check whether `self` contains all bits in `other`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check whether `self` intersects with `other` (at least one bit in common).
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for EventKind {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for EventKind {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for EventKind {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "EMPTY");
        }
        if *self == EventKind::ALL {
            return write!(f, "ALL");
        }
        let pairs: &[(EventKind, &str)] = &[
            (EventKind::CONNECTED, "CONNECTED"),
            (EventKind::DISCONNECTED, "DISCONNECTED"),
            (EventKind::CONNECTION_LOST, "CONNECTION_LOST"),
            (EventKind::STORE_CLEARED, "STORE_CLEARED"),
        ];
        let mut names = Vec::new();
        let mut known_bits: u64 = 0;
        for (kind, name) in pairs {
            known_bits |= kind.0;
            if self.contains(*kind) {
                names.push((*name).to_string());
            }
        }
        let extra = self.0 & !known_bits;
        if extra != 0 {
            names.push(format!("0x{:x}", extra));
        }
        write!(f, "{}", names.join("|"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DeviceEvent
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceEvent {
    pub kinds: EventKind,
    /// Device the event is about, `None` for store-wide events.
    pub device_id: Option<DeviceId>,
    /// User facing text.
    pub message: String,
    /// Seconds since the controller was created. Set by [`EventController::emit`].
    pub timestamp: f64,
}

impl DeviceEvent {
    pub fn new(kinds: EventKind, device_id: Option<DeviceId>, message: impl Into<String>) -> Self {
        Self {
            kinds,
            device_id,
            message: message.into(),
            timestamp: 0.0,
        }
    }

    pub fn connected(device_id: &DeviceId) -> Self {
        Self::new(
            EventKind::CONNECTED,
            Some(device_id.clone()),
            format!("connected to {device_id}"),
        )
    }

    pub fn disconnected(device_id: &DeviceId) -> Self {
        Self::new(
            EventKind::DISCONNECTED,
            Some(device_id.clone()),
            format!("disconnected from {device_id}"),
        )
    }

    pub fn connection_lost(device_id: &DeviceId) -> Self {
        Self::new(
            EventKind::CONNECTION_LOST,
            Some(device_id.clone()),
            format!("connection to {device_id} was lost"),
        )
    }

    pub fn store_cleared() -> Self {
        Self::new(EventKind::STORE_CLEARED, None, "plot cleared")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventFilter
// ─────────────────────────────────────────────────────────────────────────────

/// An OR-mask selecting which event categories a subscriber receives.
#[derive(Debug, Clone, Copy)]
pub struct EventFilter {
    pub mask: EventKind,
}

impl EventFilter {
    pub const fn all() -> Self {
        Self {
            mask: EventKind::ALL,
        }
    }

    pub const fn only(mask: EventKind) -> Self {
        Self { mask }
    }

    #[inline]
    pub fn matches(&self, event: &DeviceEvent) -> bool {
        event.kinds.intersects(self.mask)
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::all()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventController
// ─────────────────────────────────────────────────────────────────────────────

struct Subscriber {
    filter: EventFilter,
    sender: Sender<DeviceEvent>,
}

struct EventCtrlInner {
    subscribers: Vec<Subscriber>,
    start_instant: Instant,
}

/// Distributes device events to subscribers. Cheap to clone; all clones share subscribers.
#[derive(Clone)]
pub struct EventController {
    inner: Arc<Mutex<EventCtrlInner>>,
}

impl EventController {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(EventCtrlInner {
                subscribers: Vec::new(),
                start_instant: Instant::now(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EventCtrlInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to events matching the given filter.
    pub fn subscribe(&self, filter: EventFilter) -> Receiver<DeviceEvent> {
        let (tx, rx) = std::sync::mpsc::channel();
        self.lock().subscribers.push(Subscriber { filter, sender: tx });
        rx
    }

    pub fn subscribe_all(&self) -> Receiver<DeviceEvent> {
        self.subscribe(EventFilter::all())
    }

    /// Deliver an event to every matching subscriber. Subscribers whose receiver was
    /// dropped are removed.
    pub fn emit(&self, mut event: DeviceEvent) {
        let mut inner = self.lock();
        event.timestamp = inner.start_instant.elapsed().as_secs_f64();
        inner.subscribers.retain(|sub| {
            if sub.filter.matches(&event) {
                sub.sender.send(event.clone()).is_ok()
            } else {
                true
            }
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

impl Default for EventController {
    fn default() -> Self {
        Self::new()
    }
}
