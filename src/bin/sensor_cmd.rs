use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use vn_ins::ins::command;

/// One-shot register command utility: suspends the sensor's asynchronous
/// output, sends `$VN<register>,<args>*<checksum>` and prints the response.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Serial device name.
    port: String,

    /// Register command, e.g. RRG, WRG or ASY.
    register: String,

    /// Arguments appended to the command, comma-joined.
    args: Vec<String>,

    #[arg(short, long, default_value_t = 115200)]
    baud_rate: u32,

    #[arg(short, long, default_value_t = 1000)]
    timeout_ms: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut port = serialport::new(args.port.clone(), args.baud_rate)
        .timeout(Duration::from_millis(args.timeout_ms))
        .open()
        .with_context(|| format!("could not open serial port '{}'", args.port))?;

    let arg_refs: Vec<&str> = args.args.iter().map(String::as_str).collect();

    println!(
        "Command : {}",
        command::format_command(&args.register, &arg_refs).trim_end()
    );
    let response = command::send_command(port.as_mut(), &args.register, &arg_refs)?;
    println!("Response: {response}");

    Ok(())
}
