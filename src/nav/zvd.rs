use nalgebra::Vector3;
use serde::Deserialize;

/// Exclusive band of angular rates considered "at rest" on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RateBand {
    pub min: f64,
    pub max: f64,
}

impl RateBand {
    pub fn symmetric(half_width: f64) -> Self {
        Self {
            min: -half_width,
            max: half_width,
        }
    }

    fn contains(&self, value: f64) -> bool {
        self.min < value && value < self.max
    }
}

/// Zero-velocity detection settings. The default bands are the tuned
/// values for a VN-100 strapped to the target platform.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ZvdConfig {
    pub band_x: RateBand,
    pub band_y: RateBand,
    pub band_z: RateBand,
    /// Consecutive in-band frames required before reporting stationary.
    /// Raise above 1 for hysteresis on noisy mounts.
    pub threshold: u32,
}

impl Default for ZvdConfig {
    fn default() -> Self {
        Self {
            band_x: RateBand::symmetric(0.0012),
            band_y: RateBand::symmetric(0.0012),
            band_z: RateBand::symmetric(0.0016),
            threshold: 1,
        }
    }
}

/// Debounced stationarity detector: a frame with all three angular-rate
/// components strictly inside their band increments a run-length counter,
/// any excursion resets it. Stationary once the counter reaches the
/// configured threshold.
#[derive(Debug, Clone)]
pub struct ZeroVelocityDetector {
    config: ZvdConfig,
    count: u32,
}

impl ZeroVelocityDetector {
    pub fn new(config: ZvdConfig) -> Self {
        Self { config, count: 0 }
    }

    /// Feed one angular-rate sample and report whether the platform is
    /// considered stationary.
    pub fn observe(&mut self, angular_rate: &Vector3<f64>) -> bool {
        let in_band = self.config.band_x.contains(angular_rate.x)
            && self.config.band_y.contains(angular_rate.y)
            && self.config.band_z.contains(angular_rate.z);

        if in_band {
            self.count = self.count.saturating_add(1);
        } else {
            self.count = 0;
        }

        self.count >= self.config.threshold
    }
}
