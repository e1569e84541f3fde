use nalgebra::{Vector3, Vector4};

/// One timestamped packet of sensor measurements, as decoded from the
/// device's binary output stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Hardware timestamp since device startup. Monotonic within a session.
    pub device_time_ns: u64,
    /// Attitude quaternion (x, y, z, w), computed on the device.
    pub quaternion: Vector4<f64>,
    /// Specific force in the body frame [m/s^2].
    pub acceleration: Vector3<f64>,
    /// Angular rate in the body frame [rad/s].
    pub angular_rate: Vector3<f64>,
    /// Magnetic field in the body frame [Gauss].
    pub magnetic: Vector3<f64>,
    /// Velocity increment accumulated by the device since the previous
    /// frame.
    pub delta_velocity: Vector3<f64>,
}

impl Frame {
    /// Device timestamp in seconds.
    pub fn device_time_s(&self) -> f64 {
        self.device_time_ns as f64 * 1e-9
    }
}
