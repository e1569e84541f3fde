use log::warn;
use nalgebra::Vector3;

use super::{
    frame::Frame,
    log::SessionLog,
    state::NavigationState,
    zvd::{ZeroVelocityDetector, ZvdConfig},
};

/// Outcome of a single update, for callers that want to observe gating and
/// clock behavior without inspecting the state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateReport {
    /// Seconds elapsed since the previous frame, after anomaly handling.
    /// Never negative.
    pub dt: f64,
    /// The detector reported the platform stationary for this frame.
    pub stationary: bool,
    /// The device clock went backwards; kinematics were frozen for this
    /// frame.
    pub time_anomaly: bool,
}

/// Per-sample state transition of the dead-reckoning session.
///
/// Each update rebases the device timestamp onto session time, copies the
/// raw measurements through, accumulates the device-integrated velocity
/// increments (unless the zero-velocity detector reports stationary, which
/// hard-resets the velocity) and advances position with the trapezoidal
/// rule over the old and new velocity.
#[derive(Debug)]
pub struct UpdateEngine {
    state: NavigationState,
    detector: ZeroVelocityDetector,
    log: SessionLog,
}

impl UpdateEngine {
    pub fn new(zvd: ZvdConfig) -> Self {
        Self {
            state: NavigationState::default(),
            detector: ZeroVelocityDetector::new(zvd),
            log: SessionLog::default(),
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut SessionLog {
        &mut self.log
    }

    /// Consume one frame and advance the navigation state.
    ///
    /// A device timestamp older than the current session time is a clock
    /// anomaly: the frame's sensor values are still copied through, but
    /// `dt` is clamped to zero, session time keeps its previous value and
    /// no velocity increment is accumulated for this frame.
    pub fn update(&mut self, frame: &Frame) -> UpdateReport {
        let device_time = frame.device_time_s();
        let offset = *self.state.time_offset.get_or_insert(device_time);
        let new_time = device_time - offset;

        let time_anomaly = new_time < self.state.time;
        let dt = if time_anomaly {
            warn!(
                "device clock went backwards ({new_time:.9} s < {:.9} s), freezing kinematics for this frame",
                self.state.time
            );
            0.0
        } else {
            let dt = new_time - self.state.time;
            self.state.time = new_time;
            dt
        };

        self.state.quaternion = frame.quaternion;
        self.state.acceleration = frame.acceleration;
        self.state.angular_rate = frame.angular_rate;
        self.state.magnetic = frame.magnetic;
        self.state.delta_velocity = frame.delta_velocity;

        let previous_velocity = self.state.velocity;
        let stationary = self.detector.observe(&self.state.angular_rate);
        if stationary {
            self.state.velocity = Vector3::zeros();
        } else if !time_anomaly {
            self.state.velocity += self.state.delta_velocity;
        }

        self.state.position += (self.state.velocity + previous_velocity) * (dt * 0.5);

        self.log.record(&self.state);

        UpdateReport {
            dt,
            stationary,
            time_anomaly,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    use super::*;

    fn frame_at(device_time_ns: u64) -> Frame {
        Frame {
            device_time_ns,
            quaternion: Vector4::new(0.0, 0.0, 0.0, 1.0),
            acceleration: Vector3::new(0.0, 0.0, -9.81),
            // Angular rate well outside every band, so the detector never
            // fires unless a test overrides it.
            angular_rate: Vector3::new(0.1, 0.1, 0.1),
            magnetic: Vector3::new(0.2, 0.0, 0.4),
            delta_velocity: Vector3::zeros(),
        }
    }

    #[test]
    fn test_first_frame_rebases_to_zero() {
        let mut engine = UpdateEngine::new(ZvdConfig::default());

        let report = engine.update(&frame_at(5_000_000_000));

        assert_eq!(report.dt, 0.0);
        assert!(!report.time_anomaly);
        assert_eq!(engine.state().time, 0.0);
        assert_eq!(engine.state().velocity, Vector3::zeros());
        assert_eq!(engine.state().position, Vector3::zeros());
    }

    #[test]
    fn test_sensor_values_copied_through() {
        let mut engine = UpdateEngine::new(ZvdConfig::default());
        let frame = frame_at(0);

        engine.update(&frame);

        let state = engine.state();
        assert_eq!(state.quaternion, frame.quaternion);
        assert_eq!(state.acceleration, frame.acceleration);
        assert_eq!(state.angular_rate, frame.angular_rate);
        assert_eq!(state.magnetic, frame.magnetic);
        assert_eq!(state.delta_velocity, frame.delta_velocity);
    }

    #[test]
    fn test_time_is_monotonic_across_updates() {
        let mut engine = UpdateEngine::new(ZvdConfig::default());

        let mut previous = 0.0;
        for device_time_ns in [1_000_000_000, 1_500_000_000, 1_500_000_000, 2_000_000_000] {
            engine.update(&frame_at(device_time_ns));
            assert!(engine.state().time >= previous);
            previous = engine.state().time;
        }
    }

    #[test]
    fn test_velocity_accumulates_delta_velocity() {
        let mut engine = UpdateEngine::new(ZvdConfig::default());

        let mut frame = frame_at(0);
        frame.delta_velocity = Vector3::new(1.0, -2.0, 0.5);
        engine.update(&frame);

        frame.device_time_ns = 10_000_000;
        engine.update(&frame);

        assert_relative_eq!(engine.state().velocity.x, 2.0);
        assert_relative_eq!(engine.state().velocity.y, -4.0);
        assert_relative_eq!(engine.state().velocity.z, 1.0);
    }

    #[test]
    fn test_stationary_frame_hard_resets_velocity() {
        let mut engine = UpdateEngine::new(ZvdConfig::default());

        let mut frame = frame_at(0);
        frame.delta_velocity = Vector3::new(1.0, 1.0, 1.0);
        engine.update(&frame);
        assert_eq!(engine.state().velocity, Vector3::new(1.0, 1.0, 1.0));

        // In-band angular rate: the reset wins over the increment.
        frame.device_time_ns = 10_000_000;
        frame.angular_rate = Vector3::zeros();
        let report = engine.update(&frame);

        assert!(report.stationary);
        assert_eq!(engine.state().velocity, Vector3::zeros());
    }

    #[test]
    fn test_trapezoidal_position_integration() {
        let mut engine = UpdateEngine::new(ZvdConfig::default());

        let mut frame = frame_at(0);
        frame.delta_velocity = Vector3::new(1.0, 0.0, 0.0);
        engine.update(&frame);
        assert_eq!(engine.state().velocity.x, 1.0);

        // previous_velocity = 1, velocity = 3, dt = 0.1
        frame.device_time_ns = 100_000_000;
        frame.delta_velocity = Vector3::new(2.0, 0.0, 0.0);
        let report = engine.update(&frame);

        assert_relative_eq!(report.dt, 0.1);
        assert_relative_eq!(engine.state().position.x, (1.0 + 3.0) * 0.1 * 0.5);
    }

    #[test]
    fn test_trapezoid_uses_pre_reset_velocity() {
        let mut engine = UpdateEngine::new(ZvdConfig::default());

        let mut frame = frame_at(0);
        frame.delta_velocity = Vector3::new(2.0, 0.0, 0.0);
        engine.update(&frame);

        // Stationary frame: velocity drops to zero, but the trapezoid still
        // sees the 2 m/s it had before the reset.
        frame.device_time_ns = 100_000_000;
        frame.angular_rate = Vector3::zeros();
        engine.update(&frame);

        assert_relative_eq!(engine.state().position.x, (2.0 + 0.0) * 0.1 * 0.5);
    }

    #[test]
    fn test_clock_rollback_freezes_kinematics() {
        let mut engine = UpdateEngine::new(ZvdConfig::default());

        let mut frame = frame_at(1_000_000_000);
        frame.delta_velocity = Vector3::new(1.0, 0.0, 0.0);
        engine.update(&frame);

        frame.device_time_ns = 2_000_000_000;
        engine.update(&frame);
        let time_before = engine.state().time;
        let velocity_before = engine.state().velocity;
        let position_before = engine.state().position;

        // Clock rolled back: values still copied, kinematics untouched.
        frame.device_time_ns = 1_500_000_000;
        frame.magnetic = Vector3::new(9.0, 9.0, 9.0);
        let report = engine.update(&frame);

        assert!(report.time_anomaly);
        assert_eq!(report.dt, 0.0);
        assert_eq!(engine.state().time, time_before);
        assert_eq!(engine.state().velocity, velocity_before);
        assert_eq!(engine.state().position, position_before);
        assert_eq!(engine.state().magnetic, Vector3::new(9.0, 9.0, 9.0));

        // A later well-behaved frame resumes integration from the time the
        // session already reached.
        frame.device_time_ns = 3_000_000_000;
        frame.magnetic = Vector3::zeros();
        let report = engine.update(&frame);
        assert!(!report.time_anomaly);
        assert_relative_eq!(report.dt, 1.0);
        assert_relative_eq!(engine.state().time, 2.0);
    }

    #[test]
    fn test_logging_records_each_processed_frame() {
        let mut engine = UpdateEngine::new(ZvdConfig::default());

        engine.update(&frame_at(0));
        assert!(engine.log().is_empty());

        engine.log_mut().start_logging();
        engine.update(&frame_at(10_000_000));
        engine.update(&frame_at(20_000_000));
        engine.log_mut().stop_logging();
        engine.update(&frame_at(30_000_000));

        assert_eq!(engine.log().len(), 2);
    }
}
