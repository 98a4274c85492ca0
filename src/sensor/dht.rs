//! DHT22 temperature/humidity sensor access.
//!
//! The hardware driver bit-bangs the DHT single-wire protocol over a GPIO
//! pin. It is feature-gated so the crate compiles on non-Raspberry-Pi
//! systems; without the `dht` feature a simulated sensor is used instead.

use crate::error::Result;
use crate::sensor::traits::SensorReader;

/// BCM pin the DHT22 data line is wired to by default.
pub const DEFAULT_DHT_PIN: u8 = 4;

#[cfg(feature = "dht")]
mod dht22 {
    use super::*;
    use crate::error::MonitorError;
    use rppal::gpio::{Gpio, IoPin, Level, Mode};
    use std::thread;
    use std::time::{Duration, Instant};

    /// One decoded temperature/humidity frame.
    #[derive(Debug, Clone, Copy)]
    struct Frame {
        temperature: f64,
        humidity: f64,
        taken_at: Instant,
    }

    /// DHT22 sensor driver using rppal.
    ///
    /// The DHT protocol delivers both values in a single 40-bit frame, and the
    /// part cannot be sampled faster than every 2 seconds. One frame is cached
    /// briefly so the temperature and humidity reads of a single poll cycle
    /// share a transaction.
    pub struct Dht22Sensor {
        pin: Option<IoPin>,
        last_frame: Option<Frame>,
    }

    /// How long a cached frame satisfies reads before a new transaction runs.
    const FRAME_TTL: Duration = Duration::from_millis(1000);

    impl Dht22Sensor {
        /// Create a driver on the default data pin.
        pub fn new() -> Result<Self> {
            Self::on_pin(DEFAULT_DHT_PIN)
        }

        /// Create a driver on the given BCM pin.
        pub fn on_pin(pin: u8) -> Result<Self> {
            let gpio = Gpio::new().map_err(|e| {
                MonitorError::sensor_error(format!("Failed to initialize GPIO: {}", e))
            })?;
            let io_pin = gpio
                .get(pin)
                .map_err(|e| {
                    MonitorError::sensor_error(format!("Failed to claim pin {}: {}", pin, e))
                })?
                .into_io(Mode::Input);

            Ok(Self {
                pin: Some(io_pin),
                last_frame: None,
            })
        }

        /// Return a frame, running a bus transaction if the cache is stale.
        ///
        /// `Ok(None)` is a transient fault (timeout or checksum mismatch): a
        /// warning is logged and the caller sees an absent value.
        fn sample(&mut self) -> Result<Option<Frame>> {
            if let Some(frame) = self.last_frame {
                if frame.taken_at.elapsed() < FRAME_TTL {
                    return Ok(Some(frame));
                }
            }

            let pin = self.pin.as_mut().ok_or_else(|| {
                MonitorError::sensor_error("sensor handle already released")
            })?;

            match read_frame(pin) {
                Ok(frame) => {
                    self.last_frame = Some(frame);
                    Ok(Some(frame))
                }
                Err(fault) => {
                    tracing::warn!("DHT22 read fault: {}", fault);
                    Ok(None)
                }
            }
        }
    }

    impl SensorReader for Dht22Sensor {
        fn read_temperature(&mut self) -> Result<Option<f64>> {
            Ok(self.sample()?.map(|f| f.temperature))
        }

        fn read_humidity(&mut self) -> Result<Option<f64>> {
            Ok(self.sample()?.map(|f| f.humidity))
        }

        fn release(&mut self) {
            if self.pin.take().is_some() {
                tracing::debug!("DHT22 pin released");
            }
            self.last_frame = None;
        }
    }

    /// Run one DHT22 bus transaction and decode the 40-bit frame.
    ///
    /// Returns a plain string describing the fault; every failure mode here is
    /// transient (the next cycle may succeed).
    fn read_frame(pin: &mut IoPin) -> std::result::Result<Frame, String> {
        // Host start signal: hold the line low for at least 1ms, then release.
        pin.set_mode(Mode::Output);
        pin.set_low();
        thread::sleep(Duration::from_millis(2));
        pin.set_mode(Mode::Input);

        // Sensor response: ~80us low, ~80us high, then 40 data bits.
        wait_for(pin, Level::Low, 100).ok_or("no response (line stayed high)")?;
        wait_for(pin, Level::High, 100).ok_or("no response preamble")?;
        wait_for(pin, Level::Low, 100).ok_or("no data start")?;

        let mut bytes = [0u8; 5];
        for bit in 0..40 {
            // Each bit: ~50us low, then a high pulse whose width encodes the bit.
            wait_for(pin, Level::High, 80).ok_or("bit start timeout")?;
            let high_us = wait_for(pin, Level::Low, 100).ok_or("bit pulse timeout")?;

            // ~28us high is a 0, ~70us high is a 1; split the difference.
            if high_us > 48 {
                bytes[bit / 8] |= 1 << (7 - (bit % 8));
            }
        }

        let sum = bytes[0]
            .wrapping_add(bytes[1])
            .wrapping_add(bytes[2])
            .wrapping_add(bytes[3]);
        if sum != bytes[4] {
            return Err(format!("checksum mismatch ({:02x} != {:02x})", sum, bytes[4]));
        }

        let humidity = u16::from_be_bytes([bytes[0], bytes[1]]) as f64 / 10.0;
        let raw_temp = u16::from_be_bytes([bytes[2] & 0x7f, bytes[3]]) as f64 / 10.0;
        let temperature = if bytes[2] & 0x80 != 0 { -raw_temp } else { raw_temp };

        if !(0.0..=100.0).contains(&humidity) {
            return Err(format!("implausible humidity {humidity}"));
        }

        Ok(Frame {
            temperature,
            humidity,
            taken_at: Instant::now(),
        })
    }

    /// Busy-wait until the line reaches `level`, returning the elapsed
    /// microseconds, or `None` after `timeout_us`.
    fn wait_for(pin: &IoPin, level: Level, timeout_us: u64) -> Option<u64> {
        let start = Instant::now();
        let timeout = Duration::from_micros(timeout_us);
        while pin.read() != level {
            if start.elapsed() > timeout {
                return None;
            }
        }
        Some(start.elapsed().as_micros() as u64)
    }
}

#[cfg(not(feature = "dht"))]
mod simulated {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    /// Simulated sensor for systems without GPIO hardware.
    ///
    /// Produces slowly drifting, plausible greenhouse values so the service
    /// can run end to end on a development machine.
    pub struct SimulatedSensor {
        released: bool,
    }

    impl SimulatedSensor {
        pub fn new() -> Result<Self> {
            Ok(Self { released: false })
        }

        fn phase(&self) -> f64 {
            let secs = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs_f64();
            // One slow oscillation roughly every 10 minutes.
            (secs / 600.0 * std::f64::consts::TAU).sin()
        }
    }

    impl SensorReader for SimulatedSensor {
        fn read_temperature(&mut self) -> Result<Option<f64>> {
            if self.released {
                tracing::warn!("simulated sensor read after release");
                return Ok(None);
            }
            Ok(Some(((21.0 + 2.5 * self.phase()) * 10.0).round() / 10.0))
        }

        fn read_humidity(&mut self) -> Result<Option<f64>> {
            if self.released {
                tracing::warn!("simulated sensor read after release");
                return Ok(None);
            }
            Ok(Some(55.0 - 5.0 * self.phase()))
        }

        fn release(&mut self) {
            self.released = true;
        }
    }
}

// Re-export the appropriate sensor implementation
#[cfg(feature = "dht")]
pub use dht22::Dht22Sensor as DefaultSensor;

#[cfg(not(feature = "dht"))]
pub use simulated::SimulatedSensor as DefaultSensor;
