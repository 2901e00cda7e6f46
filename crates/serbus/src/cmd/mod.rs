use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod listen;
pub mod publish;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Publish one message on a topic.
    Publish(PublishArgs),
    /// Listen and print received messages.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Publish(args) => publish::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Socket path to connect to.
    pub path: PathBuf,
    /// Topic to publish on (0-62).
    #[arg(long, short = 't', default_value = "0")]
    pub topic: u8,
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["file", "hex"])]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["data", "hex"])]
    pub file: Option<PathBuf>,
    /// Hex-encoded payload (e.g. 01ff3c).
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Block until the peer confirms delivery.
    #[arg(long)]
    pub confirm: bool,
    /// Confirmation deadline when --confirm is set (e.g. 2s, 200ms).
    #[arg(long, default_value = "200ms")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// Topics to subscribe to (comma-separated).
    #[arg(long, value_delimiter = ',', default_value = "0")]
    pub topics: Vec<u8>,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
