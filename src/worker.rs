//! Per-device ingestion thread.
//!
//! A worker owns one connection for its whole life. Once per sampling interval it reads
//! from the connection, and if the device is flagged for plotting, parses the received
//! lines and appends the samples to the animation store. A dead connection is reported
//! once through the event controller, after which the worker stops on its own.
//!
//! States advance `Idle -> Running -> Stopping -> Stopped` and never go back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, warn};

use crate::connection::{Connection, DeviceId};
use crate::data::animation::AnimationStore;
use crate::data::sample::{parse_samples, LineSplitter};
use crate::error::DeviceError;
use crate::events::{DeviceEvent, EventController};
use crate::registry::ActivityFlag;

/// Default pause between two reads.
pub const DEFAULT_SAMPLING_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

impl WorkerState {
    pub fn label(self) -> &'static str {
        match self {
            WorkerState::Idle => "idle",
            WorkerState::Running => "running",
            WorkerState::Stopping => "stopping",
            WorkerState::Stopped => "stopped",
        }
    }
}

#[derive(Clone)]
struct SharedState(Arc<Mutex<WorkerState>>);

impl SharedState {
    fn get(&self) -> WorkerState {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, state: WorkerState) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

/// Everything a worker shares with the rest of the application.
#[derive(Clone)]
pub struct WorkerContext {
    pub store: AnimationStore,
    pub flag: ActivityFlag,
    pub events: EventController,
    pub interval: Duration,
}

pub struct IngestionWorker {
    device_id: DeviceId,
    // Held here until `start` moves both into the thread.
    pending: Option<(Box<dyn Connection>, WorkerContext)>,
    running: Arc<AtomicBool>,
    state: SharedState,
    handle: Option<JoinHandle<()>>,
}

impl IngestionWorker {
    pub fn new(connection: Box<dyn Connection>, ctx: WorkerContext) -> Self {
        Self {
            device_id: connection.device_id().clone(),
            pending: Some((connection, ctx)),
            running: Arc::new(AtomicBool::new(false)),
            state: SharedState(Arc::new(Mutex::new(WorkerState::Idle))),
            handle: None,
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn state(&self) -> WorkerState {
        self.state.get()
    }

    /// True once the loop has exited (or the worker never ran and was stopped).
    pub fn is_finished(&self) -> bool {
        match &self.handle {
            Some(handle) => handle.is_finished(),
            None => self.state() == WorkerState::Stopped,
        }
    }

    /// Spawn the ingestion thread. Calling `start` on a worker that already started is a
    /// no-op.
    pub fn start(&mut self) -> Result<(), DeviceError> {
        let Some((connection, ctx)) = self.pending.take() else {
            return Ok(());
        };
        self.running.store(true, Ordering::SeqCst);
        self.state.set(WorkerState::Running);

        let running = Arc::clone(&self.running);
        let state = self.state.clone();
        let spawned = thread::Builder::new()
            .name(format!("ingest {}", self.device_id))
            .spawn(move || run_loop(connection, ctx, running, state));
        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(source) => {
                self.running.store(false, Ordering::SeqCst);
                self.state.set(WorkerState::Stopped);
                Err(DeviceError::Spawn {
                    device_id: self.device_id.clone(),
                    source,
                })
            }
        }
    }

    /// Ask the loop to exit and wait for it. When this returns the worker will not touch
    /// the animation store again and its connection is closed.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if self.state.get() == WorkerState::Running {
                self.state.set(WorkerState::Stopping);
            }
            if handle.join().is_err() {
                error!("ingestion worker for {} panicked", self.device_id);
            }
            self.state.set(WorkerState::Stopped);
        } else if let Some((mut connection, _)) = self.pending.take() {
            connection.close();
            self.state.set(WorkerState::Stopped);
        }
    }
}

impl Drop for IngestionWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    mut connection: Box<dyn Connection>,
    ctx: WorkerContext,
    running: Arc<AtomicBool>,
    state: SharedState,
) {
    let device_id = connection.device_id().clone();
    let mut splitter = LineSplitter::new();
    debug!("ingestion worker for {} started", device_id);

    while running.load(Ordering::SeqCst) {
        if !connection.is_connected() {
            warn!("connection to {} was lost", device_id);
            state.set(WorkerState::Stopping);
            ctx.events.emit(DeviceEvent::connection_lost(&device_id));
            break;
        }

        // Always read so the transport is drained even while the device is not plotted.
        let data = connection.read_data();
        if ctx.flag.get() {
            if let Some(text) = data {
                let lines = splitter.push(&text);
                let samples = parse_samples(&lines);
                if !samples.is_empty() {
                    ctx.store.update(&device_id, &samples);
                }
            }
        } else {
            splitter.clear();
        }

        thread::sleep(ctx.interval);
    }

    connection.close();
    state.set(WorkerState::Stopped);
    debug!("ingestion worker for {} stopped", device_id);
}
