use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};

/// Names of the serial devices present on the system, sorted.
pub fn available_ports() -> Result<Vec<String>> {
    let mut ports: Vec<String> = serialport::available_ports()
        .context("could not enumerate serial ports")?
        .into_iter()
        .map(|port| port.port_name)
        .collect();
    ports.sort();
    Ok(ports)
}

/// Print a numbered listing of the available devices and prompt until a
/// valid index is entered.
pub fn select_port() -> Result<String> {
    let ports = available_ports()?;
    if ports.is_empty() {
        bail!("no serial devices available");
    }

    let stdin = io::stdin();
    loop {
        for (index, name) in ports.iter().enumerate() {
            println!("{index:2}: {name}");
        }
        print!("please select device: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            bail!("stdin closed before a device was selected");
        }

        if let Ok(index) = line.trim().parse::<usize>() {
            if index < ports.len() {
                return Ok(ports[index].clone());
            }
        }
    }
}
