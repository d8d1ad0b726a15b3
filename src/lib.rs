//! StreamPlot crate root: re-exports and module wiring.
//!
//! StreamPlot reads newline-delimited `x,y` telemetry from serial ports and TCP sockets and
//! animates it on an egui plot. The pipeline is split into:
//! - `connection`: serial and network transports behind one [`Connection`] trait
//! - `data`: sample parsing and the shared [`AnimationStore`]
//! - `registry`: per-device activity flags toggled from the UI
//! - `worker`: one [`IngestionWorker`] thread per connected device
//! - `devices`: the [`DeviceManager`] owning workers and registry
//! - `render`: the fixed-interval [`RenderTick`] and the [`PlotSurface`] it draws on
//! - `events`: thread-safe device notifications consumed by the UI
//! - `persistence` / `config`: the settings file and runtime configuration
//! - `panels` / `app`: the egui front end

pub mod app;
pub mod config;
pub mod connection;
pub mod data;
pub mod devices;
pub mod error;
pub mod events;
pub mod panels;
pub mod persistence;
pub mod registry;
pub mod render;
pub mod worker;

pub use app::{run_app, StreamPlotApp};
pub use config::AppConfig;
pub use connection::{
    Connection, ConnectionSpec, ConnectionState, ConnectionTimeouts, DeviceConnection, DeviceId,
    NetworkConnection, SerialConnection,
};
pub use data::animation::{AnimationStore, StoreSnapshot};
pub use data::sample::{parse_line, parse_samples, LineSplitter, Sample};
pub use devices::{DeviceInfo, DeviceManager};
pub use error::{DeviceError, SettingsError};
pub use events::{DeviceEvent, EventController, EventFilter, EventKind};
pub use persistence::Settings;
pub use registry::{ActivityFlag, DeviceRegistry};
pub use render::{LineHandle, PlotSurface, RenderTick};
pub use worker::{IngestionWorker, WorkerContext, WorkerState};
