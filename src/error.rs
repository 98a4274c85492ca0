//! Error handling for the greenhouse monitor crate.

/// A specialized `Result` type for greenhouse monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// The main error type for greenhouse monitor operations.
///
/// Transient per-field sensor faults are not represented here: the sensor
/// swallows them and reports an absent value (see [`crate::sensor::SensorReader`]).
/// Any `MonitorError` escaping a poll cycle is fatal to that loop instance.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sensor hardware failed in a way that cannot be recovered per-field
    #[error("Sensor error: {0}")]
    Sensor(String),

    /// MQTT client request failed (queue closed or client gone)
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Broker connection was not acknowledged within the timeout
    #[error("Broker at {broker} did not acknowledge connection within {timeout_secs}s")]
    ConnectTimeout { broker: String, timeout_secs: u64 },

    /// Broker connection failed outright
    #[error("Broker connection error: {0}")]
    Connection(String),

    /// Payload serialization failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Web server error
    #[error("Web server error: {0}")]
    WebServer(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MonitorError {
    /// Create a new sensor error
    pub fn sensor_error(msg: impl Into<String>) -> Self {
        Self::Sensor(msg.into())
    }

    /// Create a new broker connection error
    pub fn connection_error(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
