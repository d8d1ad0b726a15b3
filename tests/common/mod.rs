#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use streamplot::{Connection, ConnectionState, DeviceId};

/// Shared script behind a [`ScriptedConnection`]; tests keep a handle to steer it.
#[derive(Default)]
pub struct Script {
    pub reads: VecDeque<String>,
    /// Returned when `reads` is empty.
    pub repeat: Option<String>,
    pub connected: bool,
    pub connect_ok: bool,
    pub read_calls: usize,
    pub connect_calls: usize,
    pub close_calls: usize,
}

#[derive(Clone)]
pub struct ScriptHandle(pub Arc<Mutex<Script>>);

impl ScriptHandle {
    pub fn push(&self, text: &str) {
        self.0.lock().unwrap().reads.push_back(text.to_string());
    }

    pub fn set_repeat(&self, text: Option<&str>) {
        self.0.lock().unwrap().repeat = text.map(str::to_string);
    }

    pub fn drop_connection(&self) {
        self.0.lock().unwrap().connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.0.lock().unwrap().connected
    }

    pub fn read_calls(&self) -> usize {
        self.0.lock().unwrap().read_calls
    }

    pub fn connect_calls(&self) -> usize {
        self.0.lock().unwrap().connect_calls
    }

    pub fn close_calls(&self) -> usize {
        self.0.lock().unwrap().close_calls
    }

    pub fn queued(&self) -> usize {
        self.0.lock().unwrap().reads.len()
    }
}

/// In-memory connection yielding scripted chunks.
pub struct ScriptedConnection {
    id: DeviceId,
    script: Arc<Mutex<Script>>,
}

impl ScriptedConnection {
    /// A connection that is already open.
    pub fn connected(id: &str) -> (Self, ScriptHandle) {
        Self::build(id, true, true)
    }

    /// A closed connection whose `connect` succeeds or fails as given.
    pub fn closed(id: &str, connect_ok: bool) -> (Self, ScriptHandle) {
        Self::build(id, false, connect_ok)
    }

    fn build(id: &str, connected: bool, connect_ok: bool) -> (Self, ScriptHandle) {
        let script = Arc::new(Mutex::new(Script {
            connected,
            connect_ok,
            ..Default::default()
        }));
        (
            Self {
                id: DeviceId::from(id),
                script: Arc::clone(&script),
            },
            ScriptHandle(script),
        )
    }
}

impl Connection for ScriptedConnection {
    fn device_id(&self) -> &DeviceId {
        &self.id
    }

    fn connect(&mut self) -> bool {
        let mut s = self.script.lock().unwrap();
        s.connect_calls += 1;
        if s.connect_ok {
            s.connected = true;
        }
        s.connect_ok
    }

    fn read_data(&mut self) -> Option<String> {
        let mut s = self.script.lock().unwrap();
        s.read_calls += 1;
        if !s.connected {
            return None;
        }
        s.reads.pop_front().or_else(|| s.repeat.clone())
    }

    fn close(&mut self) {
        let mut s = self.script.lock().unwrap();
        s.close_calls += 1;
        s.connected = false;
    }

    fn state(&self) -> ConnectionState {
        if self.script.lock().unwrap().connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    fn last_error(&self) -> Option<&str> {
        let s = self.script.lock().unwrap();
        if s.connect_ok {
            None
        } else {
            Some("scripted refusal")
        }
    }
}

/// Poll `cond` until it holds or `timeout` expires.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}
