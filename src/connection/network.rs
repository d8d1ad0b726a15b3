use std::io::{ErrorKind, Read};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use log::{info, warn};

use super::{Connection, ConnectionState, ConnectionTimeouts, DeviceId, DEFAULT_READ_CHUNK_SIZE};

/// Time left before `deadline`, or `None` once it has passed.
///
/// All addresses a host resolves to share one connect timeout.
fn remaining_budget(deadline: Instant, now: Instant) -> Option<Duration> {
    let left = deadline.saturating_duration_since(now);
    (!left.is_zero()).then_some(left)
}

/// TCP client connection to `host:port`.
pub struct NetworkConnection {
    device_id: DeviceId,
    host: String,
    port: u16,
    timeouts: ConnectionTimeouts,
    chunk_size: usize,
    stream: Option<TcpStream>,
    state: ConnectionState,
    last_error: Option<String>,
}

impl NetworkConnection {
    pub fn new(host: impl Into<String>, port: u16, timeouts: ConnectionTimeouts) -> Self {
        let host = host.into();
        Self {
            device_id: DeviceId(format!("{host}:{port}")),
            host,
            port,
            timeouts,
            chunk_size: DEFAULT_READ_CHUNK_SIZE,
            stream: None,
            state: ConnectionState::Disconnected,
            last_error: None,
        }
    }

    /// Set the maximum number of bytes returned by one `read_data` call.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    fn open_stream(&self) -> Result<TcpStream, String> {
        let addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| format!("cannot resolve {}: {e}", self.device_id))?;
        let deadline = Instant::now() + self.timeouts.connect;
        let mut last = format!("no address found for {}", self.device_id);
        for addr in addrs {
            let Some(budget) = remaining_budget(deadline, Instant::now()) else {
                last = format!("timed out connecting to {}", self.device_id);
                break;
            };
            match TcpStream::connect_timeout(&addr, budget) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(self.timeouts.read))
                        .map_err(|e| e.to_string())?;
                    return Ok(stream);
                }
                Err(e) => last = e.to_string(),
            }
        }
        Err(last)
    }

    fn fail(&mut self, reason: String) {
        warn!("connection {} failed: {}", self.device_id, reason);
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.last_error = Some(reason);
        self.state = ConnectionState::Failed;
    }
}

impl Connection for NetworkConnection {
    fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    fn connect(&mut self) -> bool {
        if self.state == ConnectionState::Connected {
            return true;
        }
        match self.open_stream() {
            Ok(stream) => {
                info!("connected to {}", self.device_id);
                self.stream = Some(stream);
                self.state = ConnectionState::Connected;
                self.last_error = None;
                true
            }
            Err(reason) => {
                warn!("could not connect to {}: {}", self.device_id, reason);
                self.last_error = Some(reason);
                self.state = ConnectionState::Failed;
                false
            }
        }
    }

    fn read_data(&mut self) -> Option<String> {
        if self.state != ConnectionState::Connected {
            return None;
        }
        let stream = self.stream.as_mut()?;
        let mut buf = vec![0u8; self.chunk_size];
        match stream.read(&mut buf) {
            Ok(0) => {
                self.fail("connection closed by peer".into());
                None
            }
            Ok(n) => Some(String::from_utf8_lossy(&buf[..n]).into_owned()),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                None
            }
            Err(e) => {
                self.fail(e.to_string());
                None
            }
        }
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
            info!("closed {}", self.device_id);
        }
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

impl Drop for NetworkConnection {
    fn drop(&mut self) {
        self.close();
    }
}
