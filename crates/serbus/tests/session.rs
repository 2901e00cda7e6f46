#![cfg(unix)]

//! Cross-crate session tests: the full engine over a Unix-stream line.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use serbus::frame::Status;
use serbus::link::UnixLine;
use serbus::node::{AckMode, Node, NodeError};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "serbus-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

#[test]
fn confirmed_publish_over_a_unix_line() {
    let dir = unique_temp_dir("session");
    let sock_path = dir.join("line.sock");
    let line = UnixLine::bind(&sock_path).expect("line should bind");

    let stop = Arc::new(AtomicBool::new(false));
    let stop_server = Arc::clone(&stop);
    let server = thread::spawn(move || {
        let link = line.accept().expect("line should accept");
        let mut node = Node::new(link);
        node.subscribe(8, |_, payload, _| {
            if payload.starts_with(b"telemetry:") {
                Status::Ok
            } else {
                Status::Rejected
            }
        })
        .expect("subscribe should succeed");

        while !stop_server.load(Ordering::SeqCst) {
            if node.poll().is_err() {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
    });

    let link = UnixLine::connect(&sock_path).expect("client should connect");
    let mut client = Node::new(link);

    let accepted = client
        .publish(8, b"telemetry:42", AckMode::Required(Duration::from_secs(2)))
        .expect("confirmed publish should succeed");
    assert_eq!(accepted, Status::Ok);

    // An acknowledged rejection is a successful round-trip carrying the
    // remote application's verdict.
    let refused = client
        .publish(8, b"junk", AckMode::Required(Duration::from_secs(2)))
        .expect("publish should still be acknowledged");
    assert_eq!(refused, Status::Rejected);

    // Nobody listens on topic 9: the frame is dropped remotely and the
    // only signal back is the deadline.
    let err = client
        .publish(9, b"void", AckMode::Required(Duration::from_millis(100)))
        .unwrap_err();
    assert!(matches!(err, NodeError::AckTimeout(_)));

    stop.store(true, Ordering::SeqCst);
    server.join().expect("server thread should complete");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unconfirmed_publishes_are_fire_and_forget() {
    let dir = unique_temp_dir("fire-and-forget");
    let sock_path = dir.join("line.sock");
    let line = UnixLine::bind(&sock_path).expect("line should bind");

    let (tx, rx) = mpsc::channel::<Vec<u8>>();
    let server = thread::spawn(move || {
        let link = line.accept().expect("line should accept");
        let mut node = Node::new(link);

        let received = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&received);
        node.subscribe(3, move |_, payload, _| {
            tx.send(payload.to_vec()).expect("channel should accept");
            counter.fetch_add(1, Ordering::SeqCst);
            Status::Ok
        })
        .expect("subscribe should succeed");

        while received.load(Ordering::SeqCst) < 3 {
            if node.poll().is_err() {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
    });

    let link = UnixLine::connect(&sock_path).expect("client should connect");
    let mut client = Node::new(link);

    for index in 0..3u8 {
        let status = client
            .publish(3, format!("msg-{index}").as_bytes(), AckMode::None)
            .expect("publish should succeed");
        assert_eq!(status, Status::Ok);
    }

    for index in 0..3u8 {
        let payload = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("message should arrive");
        assert_eq!(payload, format!("msg-{index}").into_bytes());
    }

    server.join().expect("server thread should complete");
    let _ = std::fs::remove_dir_all(&dir);
}
