//! Device connections: a uniform text-stream interface over serial ports and TCP sockets.
//!
//! Every transport implements [`Connection`]. The ingestion worker only ever talks to that
//! trait, so it does not care whether the bytes come from a USB-serial adapter or a socket.
//! All transport errors are swallowed at this boundary: `connect` reports success as a
//! `bool`, `read_data` returns `None`, and a fatal read error moves the connection into
//! [`ConnectionState::Failed`], which the worker observes through [`Connection::is_connected`].

mod network;
mod serial;

use std::fmt;
use std::time::Duration;

pub use network::NetworkConnection;
pub use serial::{available_serial_ports, SerialConnection};

use crate::error::DeviceError;

/// Baud rates offered in the connect dialog.
pub const SUPPORTED_BAUD_RATES: [u32; 12] = [
    1200, 2400, 4800, 9600, 14400, 19200, 38400, 57600, 115200, 230400, 460800, 921600,
];

/// Default number of bytes requested per socket read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 1024;

/// Unique identifier of a device.
///
/// Network devices are keyed by `address:port`, serial devices by their port name. The id
/// is fixed when the connection is created and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Failed,
}

impl ConnectionState {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected => "connected",
            ConnectionState::Failed => "failed",
        }
    }
}

/// Timeouts applied to every transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionTimeouts {
    /// Upper bound for establishing the connection.
    pub connect: Duration,
    /// Upper bound for a single blocking read. Expiry means "no data", not failure.
    pub read: Duration,
}

impl Default for ConnectionTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(1),
            read: Duration::from_secs(1),
        }
    }
}

/// Capability set shared by all transports.
pub trait Connection: Send {
    /// The immutable identifier of this device.
    fn device_id(&self) -> &DeviceId;

    /// Open the transport. Returns `false` on any failure; never panics or propagates.
    fn connect(&mut self) -> bool;

    /// Text received since the previous call, or `None` when not connected, when nothing
    /// arrived before the read timeout, or after a fatal error (which also closes the
    /// connection).
    fn read_data(&mut self) -> Option<String>;

    /// Release the transport. Safe to call repeatedly.
    fn close(&mut self);

    fn state(&self) -> ConnectionState;

    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Human readable reason for the last failure, if any.
    fn last_error(&self) -> Option<&str> {
        None
    }
}

/// What the user asked to connect to. Validated, but no resources allocated yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionSpec {
    Network { host: String, port: u16 },
    Serial { port: String, baud_rate: u32 },
}

impl ConnectionSpec {
    /// Build a network spec from the text fields of the connect dialog.
    pub fn network(host: &str, port: &str) -> Result<Self, DeviceError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(DeviceError::InvalidParameters(
                "ip address must not be empty".into(),
            ));
        }
        let port = port.trim().parse::<u16>().map_err(|_| {
            DeviceError::InvalidParameters(format!(
                "port must be a number between 0 and 65535, got '{}'",
                port.trim()
            ))
        })?;
        Ok(ConnectionSpec::Network {
            host: host.to_string(),
            port,
        })
    }

    /// Build a serial spec from the text fields of the connect dialog.
    pub fn serial(port: &str, baud_rate: &str) -> Result<Self, DeviceError> {
        let port = port.trim();
        if port.is_empty() {
            return Err(DeviceError::InvalidParameters(
                "no serial port selected".into(),
            ));
        }
        let baud_rate = match baud_rate.trim().parse::<u32>() {
            Ok(b) if b > 0 => b,
            _ => {
                return Err(DeviceError::InvalidParameters(format!(
                    "invalid baud rate '{}'",
                    baud_rate.trim()
                )))
            }
        };
        Ok(ConnectionSpec::Serial {
            port: port.to_string(),
            baud_rate,
        })
    }

    /// The id the resulting connection will carry.
    pub fn device_id(&self) -> DeviceId {
        match self {
            ConnectionSpec::Network { host, port } => DeviceId(format!("{host}:{port}")),
            ConnectionSpec::Serial { port, .. } => DeviceId(port.clone()),
        }
    }

    /// Description used in connect-failure messages.
    pub fn describe(&self) -> String {
        match self {
            ConnectionSpec::Network { host, port } => format!("{host}:{port}"),
            ConnectionSpec::Serial { port, baud_rate } => {
                format!("{port} with baudrate {baud_rate}")
            }
        }
    }

    /// Create the (still closed) connection for this spec.
    pub fn build(
        self,
        timeouts: ConnectionTimeouts,
        read_chunk_size: usize,
    ) -> DeviceConnection {
        match self {
            ConnectionSpec::Network { host, port } => DeviceConnection::Network(
                NetworkConnection::new(host, port, timeouts).with_chunk_size(read_chunk_size),
            ),
            ConnectionSpec::Serial { port, baud_rate } => {
                DeviceConnection::Serial(SerialConnection::new(port, baud_rate, timeouts.read))
            }
        }
    }
}

/// The two concrete transports behind one type.
pub enum DeviceConnection {
    Serial(SerialConnection),
    Network(NetworkConnection),
}

impl DeviceConnection {
    pub fn kind(&self) -> &'static str {
        match self {
            DeviceConnection::Serial(_) => "serial",
            DeviceConnection::Network(_) => "network",
        }
    }
}

impl Connection for DeviceConnection {
    fn device_id(&self) -> &DeviceId {
        match self {
            DeviceConnection::Serial(c) => c.device_id(),
            DeviceConnection::Network(c) => c.device_id(),
        }
    }

    fn connect(&mut self) -> bool {
        match self {
            DeviceConnection::Serial(c) => c.connect(),
            DeviceConnection::Network(c) => c.connect(),
        }
    }

    fn read_data(&mut self) -> Option<String> {
        match self {
            DeviceConnection::Serial(c) => c.read_data(),
            DeviceConnection::Network(c) => c.read_data(),
        }
    }

    fn close(&mut self) {
        match self {
            DeviceConnection::Serial(c) => c.close(),
            DeviceConnection::Network(c) => c.close(),
        }
    }

    fn state(&self) -> ConnectionState {
        match self {
            DeviceConnection::Serial(c) => c.state(),
            DeviceConnection::Network(c) => c.state(),
        }
    }

    fn last_error(&self) -> Option<&str> {
        match self {
            DeviceConnection::Serial(c) => c.last_error(),
            DeviceConnection::Network(c) => c.last_error(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_spec_id_is_address_and_port() {
        let spec = ConnectionSpec::network("192.168.1.20", " 5000 ").unwrap();
        assert_eq!(spec.device_id(), DeviceId::from("192.168.1.20:5000"));
    }

    #[test]
    fn network_spec_rejects_bad_port() {
        assert!(ConnectionSpec::network("127.0.0.1", "70000").is_err());
        assert!(ConnectionSpec::network("127.0.0.1", "abc").is_err());
        assert!(ConnectionSpec::network("", "5000").is_err());
    }

    #[test]
    fn serial_spec_id_is_port_name() {
        let spec = ConnectionSpec::serial("/dev/ttyACM0", "115200").unwrap();
        assert_eq!(spec.device_id(), DeviceId::from("/dev/ttyACM0"));
        assert_eq!(spec.describe(), "/dev/ttyACM0 with baudrate 115200");
    }

    #[test]
    fn serial_spec_rejects_zero_baud() {
        assert!(ConnectionSpec::serial("COM4", "0").is_err());
        assert!(ConnectionSpec::serial("", "9600").is_err());
    }

    #[test]
    fn built_connection_starts_disconnected() {
        let spec = ConnectionSpec::network("127.0.0.1", "9").unwrap();
        let conn = spec.build(ConnectionTimeouts::default(), DEFAULT_READ_CHUNK_SIZE);
        assert_eq!(conn.kind(), "network");
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(!conn.is_connected());
        assert_eq!(conn.device_id().as_str(), "127.0.0.1:9");
    }
}
