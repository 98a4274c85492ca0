//! Sensor abstraction and implementations.
//!
//! This module provides the [`SensorReader`] trait over a single physical
//! temperature/humidity sensor, the [`Reading`] record produced per poll
//! cycle, and two implementations: a bit-banged DHT22 driver (feature-gated
//! for Raspberry Pi builds) and a simulated sensor for everything else.

pub mod dht;
pub mod reading;
pub mod traits;

// Re-export commonly used items
pub use dht::DefaultSensor;
pub use reading::Reading;
pub use traits::SensorReader;

use crate::error::Result;
use crate::monitor::registry::SensorFactory;
use std::sync::Arc;

/// A factory producing the default sensor for this build.
///
/// Each monitoring session gets its own sensor instance, so the hardware
/// handle has exactly one owner at a time.
pub fn default_sensor_factory() -> SensorFactory {
    Arc::new(|| {
        let sensor = DefaultSensor::new()?;
        Ok(Box::new(sensor) as Box<dyn SensorReader + Send>)
    })
}

/// Read both sensor values once, outside any monitoring loop.
///
/// Used by the `probe` CLI command. Transient faults surface as absent
/// fields, exactly as they would inside a poll cycle.
pub fn probe_once(greenhouse_id: &str) -> Result<Reading> {
    let mut sensor = DefaultSensor::new()?;
    let temperature = sensor.read_temperature()?;
    let humidity = sensor.read_humidity()?;
    sensor.release();
    Ok(Reading::now(greenhouse_id, temperature, humidity))
}
