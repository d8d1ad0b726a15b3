mod common;

use std::io::Write;
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use common::wait_until;
use streamplot::{
    AnimationStore, Connection, ConnectionSpec, ConnectionState, ConnectionTimeouts, DeviceId,
    DeviceManager, EventController, NetworkConnection,
};

fn timeouts() -> ConnectionTimeouts {
    ConnectionTimeouts {
        connect: Duration::from_millis(500),
        read: Duration::from_millis(50),
    }
}

#[test]
fn reads_text_until_peer_closes() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let server = thread::spawn(move || {
        let (mut sock, _) = listener.accept().unwrap();
        sock.write_all(b"1,2\n3,4\n").unwrap();
        // Keep the socket open until the client has read.
        let _ = done_rx.recv_timeout(Duration::from_secs(2));
    });

    let mut conn = NetworkConnection::new("127.0.0.1", port, timeouts());
    assert_eq!(conn.device_id(), &DeviceId(format!("127.0.0.1:{port}")));
    assert!(conn.connect());
    assert!(conn.is_connected());

    let mut text = String::new();
    assert!(wait_until(Duration::from_secs(2), || {
        if let Some(chunk) = conn.read_data() {
            text.push_str(&chunk);
        }
        text.ends_with("3,4\n")
    }));
    assert_eq!(text, "1,2\n3,4\n");

    done_tx.send(()).unwrap();
    server.join().unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        let _ = conn.read_data();
        !conn.is_connected()
    }));
    assert_eq!(conn.read_data(), None);
}

#[test]
fn read_timeout_is_not_a_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let server = thread::spawn(move || {
        let (_sock, _) = listener.accept().unwrap();
        let _ = done_rx.recv_timeout(Duration::from_secs(2));
    });

    let mut conn = NetworkConnection::new("127.0.0.1", port, timeouts());
    assert!(conn.connect());
    assert_eq!(conn.read_data(), None);
    assert!(conn.is_connected());

    conn.close();
    conn.close();
    assert_eq!(conn.state(), ConnectionState::Disconnected);
    assert_eq!(conn.read_data(), None);

    done_tx.send(()).unwrap();
    server.join().unwrap();
}

#[test]
fn refused_connect_returns_false() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut conn = NetworkConnection::new("127.0.0.1", port, timeouts());
    assert!(!conn.connect());
    assert_eq!(conn.state(), ConnectionState::Failed);
    assert!(conn.last_error().is_some());
    assert_eq!(conn.read_data(), None);
}

#[test]
fn streamed_samples_reach_the_store() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let server = thread::spawn(move || {
        let (mut sock, _) = listener.accept().unwrap();
        for i in 0..20 {
            if done_rx.try_recv().is_ok() {
                break;
            }
            let _ = writeln!(sock, "{i},{}", i * 2);
            thread::sleep(Duration::from_millis(10));
        }
        let _ = done_rx.recv_timeout(Duration::from_secs(2));
    });

    let mut mgr = DeviceManager::new(AnimationStore::new(5), EventController::new())
        .with_sampling_interval(Duration::from_millis(2))
        .with_timeouts(timeouts());
    let id = mgr
        .connect(ConnectionSpec::network("127.0.0.1", &port.to_string()).unwrap())
        .unwrap();
    mgr.set_active(&id, true).unwrap();

    assert!(wait_until(Duration::from_secs(3), || {
        mgr.store().samples(&id).map(|s| s.len()) == Some(5)
    }));
    let samples = mgr.store().samples(&id).unwrap();
    assert!(samples.iter().all(|s| s.y == s.x * 2.0));
    assert!(samples.windows(2).all(|w| w[0].x < w[1].x));

    mgr.disconnect(&id).unwrap();
    let _ = done_tx.send(());
    server.join().unwrap();
}

#[test]
fn refused_device_is_reported_as_connect_failure() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut mgr = DeviceManager::new(AnimationStore::default(), EventController::new())
        .with_timeouts(timeouts());
    let err = mgr
        .connect(ConnectionSpec::network("127.0.0.1", &port.to_string()).unwrap())
        .unwrap_err();
    assert!(err
        .to_string()
        .starts_with(&format!("failed to connect to 127.0.0.1:{port}")));
    assert!(mgr.is_empty());
}
