use nalgebra::{Vector3, Vector4};

/// Latest navigation solution. Owned by the update engine; every quantity
/// stays at zero until the first frame has been processed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationState {
    /// Seconds since the first frame of the session. Non-decreasing.
    pub time: f64,
    /// Device time of the first frame, captured exactly once and used to
    /// rebase all later timestamps.
    pub(crate) time_offset: Option<f64>,
    pub quaternion: Vector4<f64>,
    pub acceleration: Vector3<f64>,
    pub angular_rate: Vector3<f64>,
    pub magnetic: Vector3<f64>,
    pub delta_velocity: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub position: Vector3<f64>,
}
