use std::{
    env,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::info;
use vn_ins::{
    config::InsConfig,
    display,
    ins::{Ins, stub::StubIns, vectornav::VectorNavIns},
    ports,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// VectorNav VN-100 over a serial link.
    Vn100,
    /// No hardware; every quantity stays at zero.
    Stub,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Serial device; interactive pick when omitted.
    port: Option<String>,

    #[arg(short, long, default_value_t = 921600)]
    baud_rate: u32,

    /// Record every processed frame and save the session on exit.
    #[arg(short, long)]
    log: bool,

    /// Where the recorded session is written.
    #[arg(short, long, default_value = "session.h5")]
    out: PathBuf,

    #[arg(short, long, value_enum, default_value_t = Backend::Vn100)]
    device: Backend,

    #[arg(short, long, default_value = "config/ins.toml")]
    config: PathBuf,
}

fn main() -> Result<()> {
    // Default log level to "info"
    if env::var("RUST_LOG").is_err() {
        unsafe { env::set_var("RUST_LOG", "info") }
    }
    pretty_env_logger::init();

    let args = Args::parse();

    let config = if args.config.exists() {
        InsConfig::load(&args.config)?
    } else {
        info!(
            "No configuration at '{}', using defaults",
            args.config.display()
        );
        InsConfig::default()
    };

    let mut ins: Box<dyn Ins> = match args.device {
        Backend::Vn100 => {
            let port = match args.port.clone() {
                Some(port) => port,
                None => ports::select_port()?,
            };
            Box::new(VectorNavIns::new(port, args.baud_rate, config.clone()))
        }
        Backend::Stub => Box::new(StubIns::default()),
    };

    ins.start()?;
    if args.log {
        ins.start_logging();
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))?;
    }

    display::run(
        ins.as_ref(),
        Duration::from_millis(config.display_refresh_ms),
        Duration::from_millis(config.stale_after_ms),
        &stop,
    )?;

    if ins.is_logging() {
        ins.stop_logging();
        info!("Saving session log to '{}'", args.out.display());
        ins.save_log(&args.out)?;
    }

    ins.stop()?;

    Ok(())
}
