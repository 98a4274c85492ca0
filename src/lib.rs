//! # Greenhouse Monitor
//!
//! A small Rust crate for polling a DHT-class temperature/humidity sensor and
//! publishing JSON readings to an MQTT broker, with an HTTP control surface
//! for starting and stopping the monitoring loop.
//!
//! ## Features
//!
//! - **Periodic sensor polling**: temperature and humidity read on a fixed interval
//! - **MQTT publishing**: complete readings published to `greenhouse/<id>/data`
//! - **Real cancellation**: `/stop` actually stops running loops
//! - **DHT22 hardware support**: bit-banged GPIO driver (feature-gated)
//! - **Library + Binary**: use as a crate or standalone service
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use greenhouse_monitor::{MonitorConfig, MqttPublisher, SessionRegistry};
//! use greenhouse_monitor::sensor::default_sensor_factory;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = MonitorConfig::from_env()?;
//!     let publisher = Arc::new(MqttPublisher::connect(&config).await?);
//!     let registry = SessionRegistry::new(config, default_sensor_factory(), publisher);
//!     let session_id = registry.start()?;
//!     println!("monitoring session {} running", session_id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod monitor;
pub mod mqtt;
pub mod sensor;
pub mod web;

// Re-export public API
pub use config::MonitorConfig;
pub use error::{MonitorError, Result};
pub use monitor::{
    registry::{SessionRegistry, SessionStatus},
    session::{LoopState, MonitorHandle, StopReason},
};
pub use mqtt::publisher::{MqttPublisher, ReadingPublisher};
pub use sensor::{reading::Reading, traits::SensorReader, DefaultSensor};
pub use web::{start_web_server, WebConfig};

/// The default poll interval between sensor read cycles, in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 2;

/// The default broker connect timeout, in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 60;

/// The default MQTT broker port
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// The default web server port
pub const DEFAULT_WEB_PORT: u16 = 8000;
