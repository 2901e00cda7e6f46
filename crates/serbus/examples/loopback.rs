//! In-process demo: two endpoints talking over a memory loopback.
//!
//! Run with:
//!   cargo run --example loopback

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serbus::frame::Status;
use serbus::link::MemoryLink;
use serbus::node::{AckMode, Node};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (left, right) = MemoryLink::pair();
    let mut publisher = Node::new(left);
    let mut subscriber = Node::new(right);

    subscriber.subscribe(1, |topic, payload, status| {
        eprintln!(
            "received on topic {topic} ({status}): {}",
            String::from_utf8_lossy(payload)
        );
        Status::Ok
    })?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_pump = Arc::clone(&stop);
    let pump = thread::spawn(move || {
        while !stop_pump.load(Ordering::SeqCst) {
            if subscriber.poll().is_err() {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
    });

    publisher.publish(1, b"hello without confirmation", AckMode::None)?;
    let status = publisher.publish(1, b"hello with confirmation", AckMode::required())?;
    eprintln!("confirmed publish acknowledged with: {status}");

    stop.store(true, Ordering::SeqCst);
    pump.join().expect("pump thread should complete");
    Ok(())
}
