//! Runtime configuration of the application window and the ingestion pipeline.

use std::path::PathBuf;
use std::time::Duration;

use crate::connection::{ConnectionTimeouts, DEFAULT_READ_CHUNK_SIZE};
use crate::data::animation::DEFAULT_MAX_POINTS;
use crate::persistence::{Settings, DEFAULT_SETTINGS_FILE};
use crate::render::DEFAULT_RENDER_INTERVAL;
use crate::worker::DEFAULT_SAMPLING_INTERVAL;

/// Values pre-filled in the connect dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectDefaults {
    pub ip_address: String,
    pub port: String,
    pub baud_rate: String,
}

pub struct AppConfig {
    /// Window title.
    pub title: String,
    /// Where connect dialog entries are remembered.
    pub settings_path: PathBuf,
    pub sampling_interval: Duration,
    pub render_interval: Duration,
    pub max_points: usize,
    pub timeouts: ConnectionTimeouts,
    pub read_chunk_size: usize,
    pub connect_defaults: ConnectDefaults,
    /// Optional eframe native options. `None` uses a 1400x900 window.
    pub native_options: Option<eframe::NativeOptions>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "StreamPlot".into(),
            settings_path: PathBuf::from(DEFAULT_SETTINGS_FILE),
            sampling_interval: DEFAULT_SAMPLING_INTERVAL,
            render_interval: DEFAULT_RENDER_INTERVAL,
            max_points: DEFAULT_MAX_POINTS,
            timeouts: ConnectionTimeouts::default(),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            connect_defaults: ConnectDefaults {
                baud_rate: "9600".into(),
                ..Default::default()
            },
            native_options: None,
        }
    }
}

impl AppConfig {
    /// Build the configuration from loaded settings.
    pub fn from_settings(settings: &Settings, settings_path: impl Into<PathBuf>) -> Self {
        Self {
            settings_path: settings_path.into(),
            sampling_interval: settings.sampling_interval(),
            render_interval: settings.render_interval(),
            max_points: settings.max_points,
            timeouts: settings.timeouts(),
            read_chunk_size: settings.read_chunk_size,
            connect_defaults: ConnectDefaults {
                ip_address: settings.ip_address.clone(),
                port: settings.port.clone(),
                baud_rate: settings.baud_rate.clone(),
            },
            ..Self::default()
        }
    }
}
