use std::{
    io::{ErrorKind, Read},
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use log::{info, warn};

use super::{Ins, SensorVectors, Snapshot, command, wire};
use crate::{config::InsConfig, nav::UpdateEngine};

/// Engine core shared between the consumer thread (the single writer) and
/// the presentation and logging paths (short-lock readers).
#[derive(Debug)]
struct Core {
    engine: UpdateEngine,
    frames: u64,
    last_frame_at: Option<Instant>,
}

/// Serial-attached VN-100 session.
///
/// `start` acquires the port, switches the device to the binary output
/// layout the codec expects and spawns two threads: a reader that decodes
/// the stream into frames and pushes them down a bounded channel, and a
/// consumer that runs the update engine on each frame. `stop` (also run on
/// drop) tears both down and releases the port on every path.
pub struct VectorNavIns {
    port_name: String,
    baud_rate: u32,
    config: InsConfig,
    core: Arc<Mutex<Core>>,
    stop_flag: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    consumer: Option<JoinHandle<()>>,
}

impl VectorNavIns {
    pub fn new(port_name: String, baud_rate: u32, config: InsConfig) -> Self {
        let core = Core {
            engine: UpdateEngine::new(config.zvd),
            frames: 0,
            last_frame_at: None,
        };

        Self {
            port_name,
            baud_rate,
            config,
            core: Arc::new(Mutex::new(core)),
            stop_flag: Arc::new(AtomicBool::new(false)),
            reader: None,
            consumer: None,
        }
    }
}

impl Ins for VectorNavIns {
    fn start(&mut self) -> Result<()> {
        if self.reader.is_some() {
            return Ok(());
        }

        let mut port = serialport::new(self.port_name.clone(), self.baud_rate)
            .timeout(Duration::from_millis(self.config.serial_timeout_ms))
            .open()
            .with_context(|| format!("could not open serial port '{}'", self.port_name))?;

        info!("Connected to '{}' at {} baud", self.port_name, self.baud_rate);

        // Quiet the ASCII stream, then request the binary output layout
        // the frame codec is built for.
        command::switch_async_output(port.as_mut(), false)?;
        command::write_command(
            port.as_mut(),
            &command::format_command(
                "WRG",
                &[
                    "75",
                    "2",
                    "4",
                    &format!("{:02X}", wire::GROUPS),
                    &format!("{:04X}", wire::COMMON_FIELDS),
                    &format!("{:04X}", wire::IMU_FIELDS),
                ],
            ),
        )?;

        self.stop_flag.store(false, Ordering::Relaxed);

        let (tx, rx) = flume::bounded(self.config.channel_capacity);

        let stop_flag = self.stop_flag.clone();
        let reader = thread::spawn(move || {
            let mut parser = wire::FrameParser::new();
            let mut buf = [0u8; 512];

            while !stop_flag.load(Ordering::Relaxed) {
                match port.read(&mut buf) {
                    Ok(0) => continue,
                    Ok(n) => {
                        parser.push_data(&buf[..n]);
                        while let Some(next) = parser.next_frame() {
                            match next {
                                Ok(frame) => {
                                    // A full queue blocks here and
                                    // throttles the reader.
                                    if tx.send(frame).is_err() {
                                        return;
                                    }
                                }
                                Err(err) => warn!("dropping corrupt message: {err}"),
                            }
                        }
                    }
                    Err(err) if err.kind() == ErrorKind::TimedOut => continue,
                    Err(err) => {
                        warn!("serial read failed: {err}");
                        break;
                    }
                }
            }
        });

        let core = Arc::clone(&self.core);
        let consumer = thread::spawn(move || {
            while let Ok(frame) = rx.recv() {
                let mut core = core.lock().unwrap();
                core.engine.update(&frame);
                core.frames += 1;
                core.last_frame_at = Some(Instant::now());
            }
        });

        self.reader = Some(reader);
        self.consumer = Some(consumer);

        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.reader.is_none() && self.consumer.is_none() {
            return Ok(());
        }

        info!("Stopping session on '{}'", self.port_name);
        self.stop_flag.store(true, Ordering::Relaxed);

        // The reader drops the port and its channel end; the consumer then
        // drains the queue and exits on disconnect.
        if let Some(handle) = self.reader.take() {
            if handle.join().is_err() {
                warn!("reader thread panicked during shutdown");
            }
        }
        if let Some(handle) = self.consumer.take() {
            if handle.join().is_err() {
                warn!("consumer thread panicked during shutdown");
            }
        }

        Ok(())
    }

    fn snapshot(&self) -> Snapshot {
        let core = self.core.lock().unwrap();
        let state = core.engine.state();

        Snapshot {
            time: state.time,
            quaternion: state.quaternion,
            sensors: SensorVectors {
                acceleration: state.acceleration,
                angular_rate: state.angular_rate,
                magnetic: state.magnetic,
            },
            delta_velocity: state.delta_velocity,
            velocity: state.velocity,
            position: state.position,
            frames: core.frames,
            age: core.last_frame_at.map(|at| at.elapsed()),
            logging: core.engine.log().is_logging(),
        }
    }

    fn start_logging(&mut self) {
        self.core.lock().unwrap().engine.log_mut().start_logging();
    }

    fn stop_logging(&mut self) {
        self.core.lock().unwrap().engine.log_mut().stop_logging();
    }

    fn is_logging(&self) -> bool {
        self.core.lock().unwrap().engine.log().is_logging()
    }

    fn save_log(&self, path: &Path) -> Result<()> {
        Ok(self.core.lock().unwrap().engine.log().save(path)?)
    }
}

impl Drop for VectorNavIns {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!("session teardown failed: {err}");
        }
    }
}
