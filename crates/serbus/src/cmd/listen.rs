use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serbus_frame::Status;
use serbus_link::{LinkError, UnixLine};
use serbus_node::{Node, NodeConfig, NodeError};

use crate::cmd::ListenArgs;
use crate::exit::{link_error, node_error, CliError, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let line = UnixLine::bind(&args.path).map_err(|err| link_error("bind failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let link = line.accept().map_err(|err| link_error("accept failed", err))?;
    let mut node = Node::with_config(
        link,
        NodeConfig {
            max_topics: args.topics.len().max(NodeConfig::DEFAULT_MAX_TOPICS),
        },
    );

    let received = Arc::new(AtomicUsize::new(0));
    for &topic in &args.topics {
        let counter = Arc::clone(&received);
        node.subscribe(topic, move |topic, payload, status| {
            print_message(topic, payload, status, format);
            counter.fetch_add(1, Ordering::SeqCst);
            Status::Ok
        })
        .map_err(|err| node_error("subscribe failed", err))?;
    }

    while running.load(Ordering::SeqCst) {
        match node.poll() {
            Ok(()) => {}
            Err(NodeError::Link(LinkError::Closed)) => break,
            Err(err) => return Err(node_error("receive failed", err)),
        }

        if let Some(count) = args.count {
            if received.load(Ordering::SeqCst) >= count {
                return Ok(SUCCESS);
            }
        }

        std::thread::sleep(Duration::from_millis(1));
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
