use std::io::{BufRead, BufReader, ErrorKind};
use std::time::Duration;

use log::{info, warn};
use serialport::SerialPort;

use super::{Connection, ConnectionState, DeviceId};

/// Serial port connection that yields one line per read.
pub struct SerialConnection {
    device_id: DeviceId,
    port_name: String,
    baud_rate: u32,
    timeout: Duration,
    reader: Option<BufReader<Box<dyn SerialPort>>>,
    // Bytes of a line that timed out before its terminator arrived.
    pending: String,
    state: ConnectionState,
    last_error: Option<String>,
}

impl SerialConnection {
    pub fn new(port_name: impl Into<String>, baud_rate: u32, timeout: Duration) -> Self {
        let port_name = port_name.into();
        Self {
            device_id: DeviceId(port_name.clone()),
            port_name,
            baud_rate,
            timeout,
            reader: None,
            pending: String::new(),
            state: ConnectionState::Disconnected,
            last_error: None,
        }
    }

    fn fail(&mut self, reason: String) {
        warn!("serial connection {} failed: {}", self.device_id, reason);
        self.reader = None;
        self.pending.clear();
        self.last_error = Some(reason);
        self.state = ConnectionState::Failed;
    }
}

impl Connection for SerialConnection {
    fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    fn connect(&mut self) -> bool {
        if self.state == ConnectionState::Connected {
            return true;
        }
        match serialport::new(&self.port_name, self.baud_rate)
            .timeout(self.timeout)
            .open()
        {
            Ok(port) => {
                info!(
                    "opened serial port {} at {} baud",
                    self.port_name, self.baud_rate
                );
                self.reader = Some(BufReader::new(port));
                self.pending.clear();
                self.state = ConnectionState::Connected;
                self.last_error = None;
                true
            }
            Err(e) => {
                warn!("could not open serial port {}: {}", self.port_name, e);
                self.last_error = Some(e.to_string());
                self.state = ConnectionState::Failed;
                false
            }
        }
    }

    fn read_data(&mut self) -> Option<String> {
        if self.state != ConnectionState::Connected {
            return None;
        }
        let reader = self.reader.as_mut()?;
        // A timeout leaves the partial line in `pending`; the next call continues it.
        match reader.read_line(&mut self.pending) {
            Ok(0) => {
                self.fail("unexpected end of stream".into());
                None
            }
            Ok(_) => Some(std::mem::take(&mut self.pending)),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => None,
            Err(e) if e.kind() == ErrorKind::Interrupted => None,
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                // `read_line` restored `pending` to its old contents; that prefix belongs to
                // the rejected line too.
                warn!("dropping non UTF-8 line from {}", self.device_id);
                self.pending.clear();
                None
            }
            Err(e) => {
                self.fail(e.to_string());
                None
            }
        }
    }

    fn close(&mut self) {
        if self.reader.take().is_some() {
            info!("closed serial port {}", self.port_name);
        }
        self.pending.clear();
        if self.state == ConnectionState::Connected {
            self.state = ConnectionState::Disconnected;
        }
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

/// Names of the serial ports currently present on this machine.
pub fn available_serial_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            warn!("serial port scan failed: {}", e);
            Vec::new()
        }
    }
}
