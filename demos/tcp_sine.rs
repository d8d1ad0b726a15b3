//! Example: TCP sine wave device
//!
//! What it demonstrates
//! - A stand-in network device that streams `x,y` text lines over TCP.
//! - Every accepted client gets its own producer thread.
//!
//! How to run
//! ```bash
//! cargo run --example tcp_sine -- 127.0.0.1:5000
//! cargo run --bin streamplot
//! ```
//! Then add a network device with IP `127.0.0.1` and port `5000`, and tick its checkbox.

use std::f64::consts::PI;
use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use env_logger::Env;
use log::{info, warn};

const DEFAULT_ADDR: &str = "127.0.0.1:5000";
const F_HZ: f64 = 0.5;
const PERIOD: Duration = Duration::from_millis(10);

fn stream_sine(mut sock: TcpStream) {
    let peer = sock
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "<unknown>".to_string());
    info!("streaming to {peer}");
    let mut n: u64 = 0;
    loop {
        let t = n as f64 * PERIOD.as_secs_f64();
        let y = (2.0 * PI * F_HZ * t).sin();
        if let Err(e) = writeln!(sock, "{t:.3},{y:.5}") {
            info!("client {peer} went away: {e}");
            break;
        }
        n = n.wrapping_add(1);
        thread::sleep(PERIOD);
    }
}

fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());
    let listener = TcpListener::bind(&addr)?;
    info!("sine device listening on {addr}");

    for stream in listener.incoming() {
        match stream {
            Ok(sock) => {
                thread::spawn(move || stream_sine(sock));
            }
            Err(e) => warn!("accept failed: {e}"),
        }
    }
    Ok(())
}
