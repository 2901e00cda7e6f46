use std::fs;
use std::time::Duration;

use serbus_link::UnixLine;
use serbus_node::{AckMode, Node};

use crate::cmd::PublishArgs;
use crate::exit::{link_error, node_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::OutputFormat;

pub fn run(args: PublishArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;
    let ack = if args.confirm {
        AckMode::Required(parse_duration(&args.timeout)?)
    } else {
        AckMode::None
    };

    let link = UnixLine::connect(&args.path).map_err(|err| link_error("connect failed", err))?;
    let mut node = Node::new(link);

    let status = node
        .publish(args.topic, &payload, ack)
        .map_err(|err| node_error("publish failed", err))?;

    if args.confirm {
        match format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({ "status": status.name(), "topic": args.topic })
            ),
            _ => println!("acknowledged: {status}"),
        }
    }

    Ok(SUCCESS)
}

fn resolve_payload(args: &PublishArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        });
    }
    if let Some(hex) = &args.hex {
        return decode_hex(hex);
    }
    Ok(Vec::new())
}

fn decode_hex(input: &str) -> CliResult<Vec<u8>> {
    let input = input.trim();
    if input.len() % 2 != 0 {
        return Err(CliError::new(USAGE, "--hex needs an even number of digits"));
    }
    (0..input.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&input[i..i + 2], 16)
                .map_err(|_| CliError::new(USAGE, format!("invalid hex byte: {}", &input[i..i + 2])))
        })
        .collect()
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "ms")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
