//! The reading record produced once per poll cycle.

use serde::{Deserialize, Serialize};

/// One sampled temperature/humidity pair plus metadata.
///
/// A reading is constructed fresh each poll cycle, serialized, handed to the
/// publisher, and discarded — it is never persisted. Only complete readings
/// (both fields present) are ever published.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Opaque greenhouse identifier, constant for the process lifetime
    pub greenhouse_id: String,
    /// Temperature in Celsius; absent when the read failed
    pub temperature: Option<f64>,
    /// Relative humidity in percent; absent when the read failed
    pub humidity: Option<f64>,
    /// Seconds since the Unix epoch, assigned at publish time
    pub timestamp: i64,
}

impl Reading {
    /// Create a reading stamped with the current time.
    pub fn now(greenhouse_id: impl Into<String>, temperature: Option<f64>, humidity: Option<f64>) -> Self {
        Self {
            greenhouse_id: greenhouse_id.into(),
            temperature,
            humidity,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// Whether both values are present. Partial readings are never published.
    pub fn is_complete(&self) -> bool {
        self.temperature.is_some() && self.humidity.is_some()
    }

    /// Serialize to the wire payload: a JSON object with camelCase keys.
    pub fn to_payload(&self) -> crate::error::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_wire_keys_are_camel_case() {
        let reading = Reading::now("gh-7", Some(21.5), Some(48.0));
        let payload = reading.to_payload().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();

        assert_eq!(value["greenhouseId"], "gh-7");
        assert_eq!(value["temperature"], 21.5);
        assert_eq!(value["humidity"], 48.0);
        assert!(value["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_is_complete() {
        assert!(Reading::now("gh", Some(20.0), Some(55.0)).is_complete());
        assert!(!Reading::now("gh", None, Some(55.0)).is_complete());
        assert!(!Reading::now("gh", Some(20.0), None).is_complete());
        assert!(!Reading::now("gh", None, None).is_complete());
    }

    #[test]
    fn test_reading_round_trips() {
        let reading = Reading::now("gh-7", Some(19.25), Some(61.0));
        let payload = reading.to_payload().unwrap();
        let back: Reading = serde_json::from_slice(&payload).unwrap();
        assert_eq!(back.greenhouse_id, "gh-7");
        assert_eq!(back.temperature, Some(19.25));
        assert_eq!(back.timestamp, reading.timestamp);
    }
}
