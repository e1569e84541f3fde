pub mod engine;
pub mod frame;
pub mod log;
pub mod state;
pub mod zvd;

pub use engine::{UpdateEngine, UpdateReport};
pub use frame::Frame;
pub use log::{LogError, SessionLog};
pub use state::NavigationState;
pub use zvd::{RateBand, ZeroVelocityDetector, ZvdConfig};
