//! Sine table synthesis
//!
//! One period of `y = 0.5 * y_a * sin(2πx) + y_o`, quantized to the DAC
//! resolution and biased to midrange so the waveform fits a
//! single-supply output.

use core::f64::consts::PI;

use super::params::{check_amplitude, check_frequency, check_sample_count, WaveformParameters};
use crate::config::{DAC_RESOLUTION, DAC_VOLTAGE_REF, TABLE_CAPACITY};
use crate::error::SynthError;

/// Resolution and reference voltage of the analog output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputSpec {
    /// DAC resolution in bits (1..=16)
    pub resolution_bits: u8,
    /// Full-scale output voltage
    pub voltage_reference: f32,
}

impl OutputSpec {
    /// 12-bit DAC with 3.3 V reference
    pub const DEFAULT: Self = Self {
        resolution_bits: DAC_RESOLUTION,
        voltage_reference: DAC_VOLTAGE_REF,
    };

    /// Highest representable level, `2^resolution - 1`
    #[inline]
    pub const fn max_level(&self) -> u16 {
        ((1u32 << self.resolution_bits) - 1) as u16
    }

    /// DC bias that centers the sine, `0.5 * max_level`
    #[inline]
    pub fn midrange(&self) -> f64 {
        0.5 * self.max_level() as f64
    }
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One quantized period plus its playback interval
///
/// Storage is always `N` entries; only the first `len` are meaningful.
#[derive(Clone)]
pub struct WaveformTable<const N: usize = TABLE_CAPACITY> {
    samples: [u16; N],
    len: usize,
    interval_us: f32,
    clamped: usize,
}

impl<const N: usize> WaveformTable<N> {
    /// Empty table (len 0, never handed to the tick path)
    pub const fn new() -> Self {
        Self {
            samples: [0u16; N],
            len: 0,
            interval_us: 0.0,
            clamped: 0,
        }
    }

    /// Storage capacity
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of valid samples (the synthesized `sample_count`)
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Valid samples
    #[inline]
    pub fn samples(&self) -> &[u16] {
        &self.samples[..self.len]
    }

    /// Sample at `idx`, `None` outside the valid range
    #[inline]
    pub fn get(&self, idx: usize) -> Option<u16> {
        self.samples().get(idx).copied()
    }

    /// Microseconds between successive samples
    #[inline]
    pub fn interval_us(&self) -> f32 {
        self.interval_us
    }

    /// Entries that had to be clamped into the output range
    #[inline]
    pub fn clamped(&self) -> usize {
        self.clamped
    }
}

impl<const N: usize> Default for WaveformTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> core::fmt::Debug for WaveformTable<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WaveformTable")
            .field("len", &self.len)
            .field("interval_us", &self.interval_us)
            .field("clamped", &self.clamped)
            .finish()
    }
}

/// Interval between samples: `1e6 / (frequency_hz * sample_count)`
#[inline]
pub fn interval_us(frequency_hz: f32, sample_count: usize) -> f32 {
    (1e6 / (frequency_hz as f64 * sample_count as f64)) as f32
}

/// Synthesize into caller-owned storage.
///
/// Every parameter is checked against `spec` and the capacity `N` before
/// the first write, so on error `table` is exactly as it was.
pub fn synthesize_into<const N: usize>(
    params: &WaveformParameters,
    spec: &OutputSpec,
    table: &mut WaveformTable<N>,
) -> Result<(), SynthError> {
    let n = params.sample_count();
    check_sample_count(n, N)?;
    check_frequency(params.frequency())?;
    check_amplitude(params.amplitude(), spec.voltage_reference)?;

    let max_level = spec.max_level();
    let y_max = max_level as f64;
    let y_a = params.amplitude() as f64 * y_max / spec.voltage_reference as f64;
    let y_o = spec.midrange();

    let mut clamped = 0;
    for (i, slot) in table.samples[..n].iter_mut().enumerate() {
        let x = i as f64 / n as f64;
        let y = libm::round(0.5 * y_a * libm::sin(2.0 * PI * x) + y_o);

        *slot = if y < 0.0 {
            clamped += 1;
            0
        } else if y > y_max {
            clamped += 1;
            max_level
        } else {
            y as u16
        };
    }

    table.len = n;
    table.interval_us = interval_us(params.frequency(), n);
    table.clamped = clamped;
    Ok(())
}

/// Synthesize into a fresh table
pub fn synthesize<const N: usize>(
    params: &WaveformParameters,
    spec: &OutputSpec,
) -> Result<WaveformTable<N>, SynthError> {
    let mut table = WaveformTable::new();
    synthesize_into(params, spec, &mut table)?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_level() {
        assert_eq!(OutputSpec::DEFAULT.max_level(), 4095);
        let spec = OutputSpec { resolution_bits: 8, voltage_reference: 5.0 };
        assert_eq!(spec.max_level(), 255);
    }

    #[test]
    fn test_small_capacity_rejects_default_length() {
        // 16 samples do not fit an 8-entry table
        let params = WaveformParameters::new();
        let result = synthesize::<8>(&params, &OutputSpec::DEFAULT);
        assert_eq!(result.unwrap_err(), SynthError::SampleCountOutOfRange);
    }

    #[test]
    fn test_amplitude_checked_against_output() {
        let params = WaveformParameters::with(1000.0, 3.0, 8).unwrap();
        let spec = OutputSpec { resolution_bits: 12, voltage_reference: 2.5 };
        assert_eq!(
            synthesize::<64>(&params, &spec).unwrap_err(),
            SynthError::InvalidAmplitude
        );
    }

    #[test]
    fn test_eight_bit_output() {
        let params = WaveformParameters::with(100.0, 3.3, 4).unwrap();
        let spec = OutputSpec { resolution_bits: 8, voltage_reference: 3.3 };
        let table = synthesize::<4>(&params, &spec).unwrap();
        assert_eq!(table.samples(), &[128, 255, 128, 0]);
    }
}
