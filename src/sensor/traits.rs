//! Traits for sensor access.

use crate::error::Result;

/// Trait over a single physical temperature/humidity sensor.
///
/// Each read is a point-in-time sample that may fail transiently. Transient
/// faults are swallowed inside the reader: the implementation emits a
/// diagnostic and returns `Ok(None)` rather than propagating. An `Err` means
/// the hardware failed in a way the reader cannot recover from and is fatal
/// to the calling loop instance.
///
/// No retry is performed inside the reader; retry policy, if any, belongs to
/// the caller.
pub trait SensorReader: Send {
    /// Read the temperature in Celsius. `Ok(None)` on a transient fault.
    fn read_temperature(&mut self) -> Result<Option<f64>>;

    /// Read the relative humidity in percent. `Ok(None)` on a transient fault.
    fn read_humidity(&mut self) -> Result<Option<f64>>;

    /// Release the underlying hardware handle.
    ///
    /// Must be safe to call more than once; the second call is a no-op.
    fn release(&mut self);
}
