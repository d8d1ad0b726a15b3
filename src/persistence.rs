//! Settings persistence: the shared `settings.json` key-value file.
//!
//! The file is shared with other parts of the application, so writes merge the new keys into
//! whatever object is already on disk instead of replacing it. Text fields (address, port,
//! baud rate, filter defaults) are stored as strings; a number in their place is accepted too.

use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::connection::ConnectionTimeouts;
use crate::data::animation::DEFAULT_MAX_POINTS;
use crate::error::SettingsError;

/// Default settings file name, relative to the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

const MAX_SAMPLING_INTERVAL_SECS: f64 = 60.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    #[serde(deserialize_with = "string_or_number")]
    pub ip_address: String,
    #[serde(deserialize_with = "string_or_number")]
    pub port: String,
    #[serde(deserialize_with = "string_or_number")]
    pub baud_rate: String,

    // Filter defaults of the offline processing tools, kept so they survive a save.
    #[serde(deserialize_with = "string_or_number")]
    pub filter_type: String,
    #[serde(deserialize_with = "string_or_number")]
    pub filter_cutoff: String,
    #[serde(deserialize_with = "string_or_number")]
    pub sampling_frequency: String,
    #[serde(deserialize_with = "string_or_number")]
    pub filter_order: String,

    /// Seconds between two reads of an ingestion worker.
    pub sampling_interval: f64,
    /// Samples kept per device.
    pub max_points: usize,
    pub render_interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    /// Bytes requested per socket read.
    pub read_chunk_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ip_address: String::new(),
            port: String::new(),
            baud_rate: "9600".into(),
            filter_type: "low".into(),
            filter_cutoff: "0.2".into(),
            sampling_frequency: "1000".into(),
            filter_order: "5".into(),
            sampling_interval: 0.01,
            max_points: DEFAULT_MAX_POINTS,
            render_interval_ms: 10,
            connect_timeout_ms: 1000,
            read_timeout_ms: 1000,
            read_chunk_size: 1024,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or a number, got {other}"
        ))),
    }
}

impl Settings {
    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_json::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.sampling_interval.is_finite()
            || self.sampling_interval <= 0.0
            || self.sampling_interval > MAX_SAMPLING_INTERVAL_SECS
        {
            return Err(SettingsError::Invalid(format!(
                "sampling-interval must be between 0 and {MAX_SAMPLING_INTERVAL_SECS} seconds, got {}",
                self.sampling_interval
            )));
        }
        if self.max_points == 0 {
            return Err(SettingsError::Invalid("max-points must be at least 1".into()));
        }
        if self.render_interval_ms == 0 {
            return Err(SettingsError::Invalid(
                "render-interval-ms must be at least 1".into(),
            ));
        }
        if self.connect_timeout_ms == 0 || self.read_timeout_ms == 0 {
            return Err(SettingsError::Invalid("timeouts must be at least 1 ms".into()));
        }
        if self.read_chunk_size == 0 {
            return Err(SettingsError::Invalid(
                "read-chunk-size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Write every key, keeping unrelated keys already present in the file.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => update_json_file(path, map),
            _ => Err(SettingsError::Invalid("settings did not serialize to an object".into())),
        }
    }

    pub fn sampling_interval(&self) -> Duration {
        Duration::from_secs_f64(self.sampling_interval)
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }

    pub fn timeouts(&self) -> ConnectionTimeouts {
        ConnectionTimeouts {
            connect: Duration::from_millis(self.connect_timeout_ms),
            read: Duration::from_millis(self.read_timeout_ms),
        }
    }
}

/// Merge `new_settings` into the JSON object stored at `path`, creating the file if needed.
pub fn update_json_file(path: &Path, new_settings: Map<String, Value>) -> Result<(), SettingsError> {
    let mut settings = match std::fs::read_to_string(path) {
        Ok(text) if text.trim().is_empty() => Map::new(),
        Ok(text) => match serde_json::from_str::<Value>(&text)? {
            Value::Object(map) => map,
            _ => {
                return Err(SettingsError::Invalid(format!(
                    "{} does not contain a JSON object",
                    path.display()
                )))
            }
        },
        Err(e) if e.kind() == ErrorKind::NotFound => Map::new(),
        Err(e) => return Err(e.into()),
    };
    settings.extend(new_settings);
    let text = serde_json::to_string_pretty(&Value::Object(settings))?;
    std::fs::write(path, text)?;
    Ok(())
}
