//! Module: config
//!
//! Purpose: Compile-time limits and the persisted synthesizer settings.
//!
//! Architecture:
//! - Constants: table capacity, DAC resolution/reference, defaults
//! - CONFIG: lock-free global holding the persisted parameters
//! - nvs: ESP-IDF flash persistence of CONFIG
//!
//! Safety: RT-safe. All access via atomics, no locks.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::synth::WaveformParameters;

pub mod nvs;

/// Maximum number of samples in one table.
pub const TABLE_CAPACITY: usize = 4096;

/// Sample count restored by `begin()`.
///
/// 16 samples at the default 1 kHz tick every 62.5 us, which both periodic
/// sources can deliver.
pub const DEFAULT_SAMPLE_COUNT: usize = 16;

/// Shortest tick period the periodic sources accept, in microseconds.
pub const MIN_TICK_INTERVAL_US: f32 = 50.0;

/// Longest tick period accepted at start, in microseconds (one second).
pub const MAX_TICK_INTERVAL_US: f32 = 1_000_000.0;

/// Output resolution in bits.
pub const DAC_RESOLUTION: u8 = 12;

/// Output full-scale voltage.
pub const DAC_VOLTAGE_REF: f32 = 3.3;

/// Level written by `stop()`.
pub const REST_LEVEL: u16 = 0;

/// Boot frequency when nothing is persisted.
pub const DEFAULT_FREQUENCY_HZ: f32 = 1000.0;

/// Boot amplitude when nothing is persisted (full swing).
pub const DEFAULT_AMPLITUDE_V: f32 = DAC_VOLTAGE_REF;

/// Persisted synthesizer settings.
///
/// Floats are stored as their bit patterns. Written by the console `save`
/// command and by NVS load, read at boot.
pub struct SynthConfig {
    frequency_bits: AtomicU32,
    amplitude_bits: AtomicU32,
    sample_count: AtomicU32,
    save_requested: AtomicBool,
}

/// Global settings instance.
pub static CONFIG: SynthConfig = SynthConfig::new();

impl SynthConfig {
    /// Settings at firmware defaults.
    pub const fn new() -> Self {
        Self {
            frequency_bits: AtomicU32::new(DEFAULT_FREQUENCY_HZ.to_bits()),
            amplitude_bits: AtomicU32::new(DEFAULT_AMPLITUDE_V.to_bits()),
            sample_count: AtomicU32::new(DEFAULT_SAMPLE_COUNT as u32),
            save_requested: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn frequency(&self) -> f32 {
        f32::from_bits(self.frequency_bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn amplitude(&self) -> f32 {
        f32::from_bits(self.amplitude_bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn sample_count(&self) -> u32 {
        self.sample_count.load(Ordering::Relaxed)
    }

    /// Store raw values (e.g. read back from flash), unvalidated.
    ///
    /// Validation happens in [`load`](Self::load).
    pub fn set_raw(&self, frequency_hz: f32, amplitude: f32, sample_count: u32) {
        self.frequency_bits.store(frequency_hz.to_bits(), Ordering::Relaxed);
        self.amplitude_bits.store(amplitude.to_bits(), Ordering::Relaxed);
        self.sample_count.store(sample_count, Ordering::Relaxed);
    }

    /// Copy validated parameters in.
    pub fn store(&self, params: &WaveformParameters) {
        self.set_raw(params.frequency(), params.amplitude(), params.sample_count() as u32);
    }

    /// Parameters from the stored values.
    ///
    /// Each field that fails validation (corrupt or out-of-range flash)
    /// keeps its default instead.
    pub fn load(&self) -> WaveformParameters {
        let mut params = WaveformParameters::new();
        let _ = params.set_frequency(self.frequency());
        let _ = params.set_amplitude(self.amplitude());
        let _ = params.set_sample_count(self.sample_count() as usize);
        params
    }

    /// Restore firmware defaults.
    pub fn reset(&self) {
        self.store(&WaveformParameters::new());
    }

    /// Ask the firmware loop to persist the current values.
    #[inline]
    pub fn request_save(&self) {
        self.save_requested.store(true, Ordering::Release);
    }

    /// Consume a pending save request.
    #[inline]
    pub fn take_save_request(&self) -> bool {
        self.save_requested.swap(false, Ordering::AcqRel)
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self::new()
    }
}
