//! Error types for device management and settings persistence.
//!
//! Transport-level `std::io::Error`s never show up here: connections swallow them and report
//! failure through their state. What remains are the errors a user can actually act on
//! (a device that is already connected, a port that refused the connection, a malformed
//! settings file).

use std::io;

use thiserror::Error;

use crate::connection::DeviceId;

/// Errors raised while connecting, toggling, or disconnecting devices.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Already connected to this device: {0}")]
    DuplicateDevice(DeviceId),

    #[error("failed to connect to {device_id}{}", detail_suffix(.detail))]
    ConnectFailed { device_id: DeviceId, detail: String },

    #[error("unknown device: {0}")]
    UnknownDevice(DeviceId),

    #[error("invalid connection parameters: {0}")]
    InvalidParameters(String),

    #[error("failed to start ingestion worker for {device_id}: {source}")]
    Spawn {
        device_id: DeviceId,
        #[source]
        source: io::Error,
    },
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(" ({detail})")
    }
}

/// Errors raised while loading or saving the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_failed_includes_detail_when_present() {
        let err = DeviceError::ConnectFailed {
            device_id: DeviceId::from("10.0.0.2:5000"),
            detail: "connection refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to connect to 10.0.0.2:5000 (connection refused)"
        );
    }

    #[test]
    fn connect_failed_without_detail() {
        let err = DeviceError::ConnectFailed {
            device_id: DeviceId::from("/dev/ttyUSB0"),
            detail: String::new(),
        };
        assert_eq!(err.to_string(), "failed to connect to /dev/ttyUSB0");
    }

    #[test]
    fn duplicate_message_names_device() {
        let err = DeviceError::DuplicateDevice(DeviceId::from("COM3"));
        assert_eq!(err.to_string(), "Already connected to this device: COM3");
    }
}
