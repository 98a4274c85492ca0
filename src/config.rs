//! Monitor configuration.
//!
//! Values come from the environment (`GREENHOUSE_ID`, `MQTT_BROKER_HOST`,
//! `MQTT_BROKER_PORT`, `MQTT_TOPIC`) with CLI overrides layered on top by the
//! binary. Required values are validated for presence at startup.

use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for a monitoring process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Opaque greenhouse identifier, constant for the process lifetime
    pub greenhouse_id: String,
    /// MQTT broker hostname or IP
    pub broker_host: String,
    /// MQTT broker port
    pub broker_port: u16,
    /// Explicit topic override; when `None` the topic is derived from the id
    pub topic: Option<String>,
    /// Poll interval between sensor read cycles, in seconds
    pub interval_secs: u64,
    /// How long to wait for the broker to acknowledge the connection
    pub connect_timeout_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            greenhouse_id: String::new(),
            broker_host: "localhost".to_string(),
            broker_port: crate::DEFAULT_MQTT_PORT,
            topic: None,
            interval_secs: crate::DEFAULT_INTERVAL_SECS,
            connect_timeout_secs: crate::DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl MonitorConfig {
    /// Create a configuration for the given greenhouse id and broker host.
    pub fn new(greenhouse_id: impl Into<String>, broker_host: impl Into<String>) -> Self {
        Self {
            greenhouse_id: greenhouse_id.into(),
            broker_host: broker_host.into(),
            ..Default::default()
        }
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let greenhouse_id = require_env("GREENHOUSE_ID")?;
        let broker_host = require_env("MQTT_BROKER_HOST")?;
        let broker_port = match std::env::var("MQTT_BROKER_PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|_| {
                MonitorError::config_error(format!("MQTT_BROKER_PORT is not a valid port: {raw}"))
            })?,
            Err(_) => crate::DEFAULT_MQTT_PORT,
        };
        let topic = std::env::var("MQTT_TOPIC").ok();

        Ok(Self {
            greenhouse_id,
            broker_host,
            broker_port,
            topic,
            ..Default::default()
        })
    }

    /// Set the broker port.
    pub fn with_broker_port(mut self, port: u16) -> Self {
        self.broker_port = port;
        self
    }

    /// Set an explicit publish topic, bypassing the derived one.
    pub fn with_topic(mut self, topic: Option<String>) -> Self {
        self.topic = topic;
        self
    }

    /// Set the poll interval in seconds.
    pub fn with_interval_secs(mut self, secs: u64) -> Self {
        self.interval_secs = secs;
        self
    }

    /// Set the broker connect timeout in seconds.
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Validate that the required fields are present.
    pub fn validate(&self) -> Result<()> {
        if self.greenhouse_id.is_empty() {
            return Err(MonitorError::config_error("greenhouse id must not be empty"));
        }
        if self.broker_host.is_empty() {
            return Err(MonitorError::config_error("broker host must not be empty"));
        }
        if self.interval_secs == 0 {
            return Err(MonitorError::config_error("poll interval must be at least 1 second"));
        }
        Ok(())
    }

    /// The topic readings are published to: the configured override, or
    /// `greenhouse/<greenhouseId>/data`.
    pub fn data_topic(&self) -> String {
        match &self.topic {
            Some(topic) => topic.clone(),
            None => format!("greenhouse/{}/data", self.greenhouse_id),
        }
    }

    /// Get the full broker address.
    pub fn broker_address(&self) -> String {
        format!("{}:{}", self.broker_host, self.broker_port)
    }
}

fn require_env(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(MonitorError::config_error(format!("{key} is not set"))),
    }
}
