//! MQTT publishing.
//!
//! A thin wrapper over rumqttc: a confirmed connect, fire-and-forget QoS 0
//! publishes, and a background driver task that keeps the event loop alive
//! and logs broker acknowledgements.

pub mod publisher;

pub use publisher::{MqttPublisher, ReadingPublisher};
