//! Monitoring loop sessions and their registry.
//!
//! A session is one background polling task: read the sensor on a fixed
//! interval, publish complete readings, stop on cancellation or on the first
//! unexpected fault. The registry owns all spawned sessions and is what the
//! HTTP control surface talks to.

pub mod registry;
pub mod session;

// Re-export commonly used items
pub use registry::{SensorFactory, SessionRegistry, SessionStatus};
pub use session::{LoopState, MonitorHandle, SessionParams, StopReason};
