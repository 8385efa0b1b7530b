//! # DacSynth
//!
//! Lookup-table sine synthesizer driving a DAC from a periodic timer.
//!
//! ## Architecture
//!
//! ```text
//! console ──▶ PlaybackEngine ──publish──▶ Playback (double-buffered tables)
//!                  │                          ▲
//!                  └── arms ──▶ PeriodicTimer ┘ tick: cursor+1, write_sample
//! ```
//!
//! - Tables are synthesized in the foreground only
//! - The tick reads the published table, never blocks, never allocates
//! - Hardware is reached only through the [`hal`] traits

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod console;
pub mod error;
pub mod hal;
pub mod log_globals;
pub mod logging;
pub mod stats;
pub mod synth;

pub use config::CONFIG;
pub use error::SynthError;
pub use hal::{DacOutput, PeriodicTimer, TickHandler};
pub use log_globals::LOG_STREAM;
pub use stats::{PlaybackStats, StatsSnapshot};
pub use synth::{
    EngineState, OutputSpec, Playback, PlaybackEngine, PlaybackMode, SynthControl,
    WaveformParameters, WaveformTable,
};
