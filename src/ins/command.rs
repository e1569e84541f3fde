use std::io::{ErrorKind, Read, Write};

use serialport::SerialPort;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("serial write incomplete ({written} of {expected} bytes)")]
    ShortWrite { written: usize, expected: usize },

    #[error("no response from device")]
    NoResponse,

    #[error("device rejected command {command:?}: {response:?}")]
    Rejected { command: String, response: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// XOR checksum over everything between the leading `$` and the `*`.
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0, |acc, byte| acc ^ byte)
}

/// Frame a register command as `$VN<register>,<args>*<checksum>`.
pub fn format_command(register: &str, args: &[&str]) -> String {
    let mut body = format!("VN{register}");
    for arg in args {
        body.push(',');
        body.push_str(arg);
    }
    let checksum = checksum(&body);
    format!("${body}*{checksum:02X}\r\n")
}

/// Switch the device's asynchronous ASCII output on or off. Write-only;
/// the device does not echo this reliably while streaming.
pub fn switch_async_output(port: &mut dyn SerialPort, on: bool) -> Result<(), CommandError> {
    write_command(port, &format_command("ASY", &[if on { "1" } else { "0" }]))
}

/// Write one framed command to the port, verifying the full write.
pub fn write_command(port: &mut dyn SerialPort, command: &str) -> Result<(), CommandError> {
    let bytes = command.as_bytes();
    let written = port.write(bytes)?;
    if written != bytes.len() {
        return Err(CommandError::ShortWrite {
            written,
            expected: bytes.len(),
        });
    }
    port.flush()?;
    Ok(())
}

/// Send one register command and return the device's response line.
///
/// Asynchronous output is suspended for the duration so the response is
/// not interleaved with streaming data, then resumed. The response must
/// echo the register tag, otherwise the command counts as rejected.
pub fn send_command(
    port: &mut dyn SerialPort,
    register: &str,
    args: &[&str],
) -> Result<String, CommandError> {
    let command = format_command(register, args);

    switch_async_output(port, false)?;
    drain_response(port)?;

    write_command(port, &command)?;
    let lines = drain_response(port)?;

    switch_async_output(port, true)?;

    let response = lines.last().cloned().ok_or(CommandError::NoResponse)?;
    if response.contains(&format!("$VN{register}")) {
        Ok(response)
    } else {
        Err(CommandError::Rejected {
            command: command.trim_end().to_string(),
            response,
        })
    }
}

/// Read whatever the device sends until the port goes quiet, split into
/// non-empty lines.
fn drain_response(port: &mut dyn SerialPort) -> Result<Vec<String>, CommandError> {
    let mut raw = Vec::new();
    let mut chunk = [0u8; 256];

    loop {
        match port.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => raw.extend_from_slice(&chunk[..n]),
            Err(err) if err.kind() == ErrorKind::TimedOut => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(String::from_utf8_lossy(&raw)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
