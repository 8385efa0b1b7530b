//! Sine table synthesis and playback
//!
//! Architecture:
//! - params: the three tunables plus the derived interval
//! - table: pure table synthesis (sine, midrange bias, quantize, clamp)
//! - playback: double-buffered bank shared with the tick context
//! - engine: Idle/Running state machine driving the periodic source

pub mod engine;
pub mod params;
pub mod playback;
pub mod table;

pub use engine::{EngineState, PlaybackEngine, PlaybackMode};
pub use params::WaveformParameters;
pub use playback::Playback;
pub use table::{interval_us, synthesize, synthesize_into, OutputSpec, WaveformTable};

use crate::error::SynthError;
use crate::stats::StatsSnapshot;

/// Object-safe control surface of an engine (what the console drives).
pub trait SynthControl {
    fn params(&self) -> WaveformParameters;
    fn set_frequency(&mut self, hz: f32) -> Result<(), SynthError>;
    fn set_amplitude(&mut self, volts: f32) -> Result<(), SynthError>;
    fn set_sample_count(&mut self, n: usize) -> Result<(), SynthError>;
    fn start(&mut self) -> Result<(), SynthError>;
    fn start_continuous(&mut self) -> Result<(), SynthError>;
    fn update(&mut self);
    fn stop(&mut self);
    fn state(&self) -> EngineState;
    fn interval(&self) -> f32;
    fn stats(&self) -> StatsSnapshot;

    fn is_running(&self) -> bool {
        matches!(self.state(), EngineState::Running(_))
    }
}
