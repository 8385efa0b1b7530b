//! Hardware Abstraction Layer for DacSynth.
//!
//! The engine only sees these traits. Business logic stays in `synth`,
//! HAL is just I/O.
//!
//! - [`DacOutput`]: analog output channel, written from the tick context
//! - [`PeriodicTimer`]: the periodic source that drives continuous playback
//! - [`TickHandler`]: what the periodic source calls

use crate::error::SynthError;

#[cfg(target_os = "espidf")]
pub mod ledc;
#[cfg(target_os = "espidf")]
pub mod timer;

#[cfg(target_os = "espidf")]
pub use ledc::LedcDac;
#[cfg(target_os = "espidf")]
pub use timer::EspTickTimer;

/// Fixed-resolution analog output.
///
/// Both methods take `&self`: the channel is written from the tick context
/// while the foreground holds a shared reference, so implementations must
/// be interrupt-safe and must not block.
pub trait DacOutput {
    /// Set the number of significant bits in `write_sample` levels.
    ///
    /// Called once from `begin()`.
    fn configure_resolution(&self, bits: u8);

    /// Drive the output to `level` (`0..=2^bits - 1`).
    fn write_sample(&self, level: u16);
}

/// Callback bound to the periodic source.
///
/// Must complete well inside one tick interval, never block, never allocate.
pub trait TickHandler {
    fn on_tick(&self);
}

/// Periodic interrupt source.
pub trait PeriodicTimer {
    /// Call `handler.on_tick()` every `interval_us` microseconds.
    ///
    /// Replaces any existing schedule; the old one must not fire again
    /// once this returns.
    fn schedule(
        &mut self,
        interval_us: f32,
        handler: &'static (dyn TickHandler + Sync),
    ) -> Result<(), SynthError>;

    /// Stop calling the handler. Safe to call when nothing is scheduled.
    ///
    /// A tick already dispatched may still be running when this returns.
    fn cancel(&mut self);

    /// True while a schedule is active.
    fn is_armed(&self) -> bool;

    /// Monotonic time in microseconds (log timestamps).
    fn now_us(&self) -> i64;

    /// Shortest period the source can sustain.
    fn min_interval_us(&self) -> f32 {
        1.0
    }
}
