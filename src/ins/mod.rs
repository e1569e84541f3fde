pub mod command;
pub mod stub;
pub mod vectornav;
pub mod wire;

use std::{path::Path, time::Duration};

use anyhow::Result;
use nalgebra::{Vector3, Vector4};

/// Raw sensor vectors of the latest frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorVectors {
    pub acceleration: Vector3<f64>,
    pub angular_rate: Vector3<f64>,
    pub magnetic: Vector3<f64>,
}

/// Consistent view of the navigation solution, copied under a single short
/// lock so the presentation layer never mixes quantities from different
/// frames.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Snapshot {
    /// Seconds since the first frame of the session.
    pub time: f64,
    pub quaternion: Vector4<f64>,
    pub sensors: SensorVectors,
    pub delta_velocity: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub position: Vector3<f64>,
    /// Frames processed so far; zero means nothing has arrived yet.
    pub frames: u64,
    /// Wall-clock age of the newest frame, when any has arrived.
    pub age: Option<Duration>,
    pub logging: bool,
}

/// Capability interface of an inertial navigation source.
///
/// Two backends exist: the serial-attached VN-100 session and a stub that
/// runs without hardware. The accessor methods all derive from `snapshot`
/// so that individual reads stay mutually consistent.
pub trait Ins {
    /// Acquire the device and begin processing frames.
    fn start(&mut self) -> Result<()>;

    /// Stop processing and release the device. Idempotent.
    fn stop(&mut self) -> Result<()>;

    fn snapshot(&self) -> Snapshot;

    fn current_time(&self) -> f64 {
        self.snapshot().time
    }

    fn current_quaternion(&self) -> Vector4<f64> {
        self.snapshot().quaternion
    }

    fn current_sensor_vectors(&self) -> SensorVectors {
        self.snapshot().sensors
    }

    fn current_velocity(&self) -> Vector3<f64> {
        self.snapshot().velocity
    }

    fn current_position(&self) -> Vector3<f64> {
        self.snapshot().position
    }

    fn start_logging(&mut self);

    fn stop_logging(&mut self);

    fn is_logging(&self) -> bool;

    /// Write the recorded session to `path`. Logging must be stopped first.
    fn save_log(&self, path: &Path) -> Result<()>;
}
