//! Waveform parameters
//!
//! The three tunables plus the interval derived by the last successful
//! synthesis. Setters validate; an invalid value is rejected and the
//! previous one kept.

use crate::config::{
    DAC_VOLTAGE_REF, DEFAULT_AMPLITUDE_V, DEFAULT_FREQUENCY_HZ, DEFAULT_SAMPLE_COUNT, MAX_TICK_INTERVAL_US,
    TABLE_CAPACITY,
};
use crate::error::SynthError;

/// Frequency, amplitude and table length for the next `start()`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformParameters {
    frequency_hz: f32,
    amplitude: f32,
    sample_count: usize,
    interval_us: f32,
}

impl WaveformParameters {
    /// Firmware defaults (1 kHz, full swing, 16 samples)
    pub const fn new() -> Self {
        Self {
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            amplitude: DEFAULT_AMPLITUDE_V,
            sample_count: DEFAULT_SAMPLE_COUNT,
            interval_us: 0.0,
        }
    }

    /// Build and validate a full parameter set
    pub fn with(frequency_hz: f32, amplitude: f32, sample_count: usize) -> Result<Self, SynthError> {
        let mut params = Self::new();
        params.set_frequency(frequency_hz)?;
        params.set_amplitude(amplitude)?;
        params.set_sample_count(sample_count)?;
        Ok(params)
    }

    #[inline]
    pub fn frequency(&self) -> f32 {
        self.frequency_hz
    }

    pub fn set_frequency(&mut self, hz: f32) -> Result<(), SynthError> {
        check_frequency(hz)?;
        self.frequency_hz = hz;
        Ok(())
    }

    /// Amplitude in volts (peak-to-peak swing at the output)
    #[inline]
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Checked against the default voltage reference.
    ///
    /// Synthesis re-checks against the output it targets.
    pub fn set_amplitude(&mut self, volts: f32) -> Result<(), SynthError> {
        check_amplitude(volts, DAC_VOLTAGE_REF)?;
        self.amplitude = volts;
        Ok(())
    }

    #[inline]
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn set_sample_count(&mut self, n: usize) -> Result<(), SynthError> {
        check_sample_count(n, TABLE_CAPACITY)?;
        self.sample_count = n;
        Ok(())
    }

    /// Interval from the most recent successful synthesis, 0 before the first.
    #[inline]
    pub fn derived_interval(&self) -> f32 {
        self.interval_us
    }

    #[inline]
    pub(crate) fn record_interval(&mut self, interval_us: f32) {
        self.interval_us = interval_us;
    }

    /// Set a length the caller already knows to be in `[1, TABLE_CAPACITY]`.
    pub(crate) fn restore_sample_count(&mut self, n: usize) {
        debug_assert!(check_sample_count(n, TABLE_CAPACITY).is_ok());
        self.sample_count = n;
    }
}

impl Default for WaveformParameters {
    fn default() -> Self {
        Self::new()
    }
}

/// Frequency must be finite and strictly positive
#[inline]
pub fn check_frequency(hz: f32) -> Result<(), SynthError> {
    if hz.is_finite() && hz > 0.0 {
        Ok(())
    } else {
        Err(SynthError::InvalidFrequency)
    }
}

/// Amplitude must lie in `[0, voltage_reference]`
#[inline]
pub fn check_amplitude(volts: f32, voltage_reference: f32) -> Result<(), SynthError> {
    if volts.is_finite() && volts >= 0.0 && volts <= voltage_reference {
        Ok(())
    } else {
        Err(SynthError::InvalidAmplitude)
    }
}

/// Sample count must lie in `[1, capacity]`
#[inline]
pub fn check_sample_count(n: usize, capacity: usize) -> Result<(), SynthError> {
    if n >= 1 && n <= capacity {
        Ok(())
    } else {
        Err(SynthError::SampleCountOutOfRange)
    }
}

/// Tick period must be finite and within `[min_us, MAX_TICK_INTERVAL_US]`
#[inline]
pub fn check_interval(us: f32, min_us: f32) -> Result<(), SynthError> {
    if !us.is_finite() || us > MAX_TICK_INTERVAL_US {
        Err(SynthError::IntervalTooLong)
    } else if us < min_us {
        Err(SynthError::IntervalTooShort)
    } else {
        Ok(())
    }
}
