//! NVS persistence for synthesizer settings with schema versioning.
//!
//! # Version History
//!
//! - **v1** (current): frequency (f32 bits), amplitude (f32 bits), sample count
//!
//! The partition handle is passed in by the caller: `EspDefaultNvsPartition`
//! can only be taken once per boot, and the firmware keeps it for both
//! load and save.

use core::cmp::Ordering;

use super::SynthConfig;

#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::EspError;

/// Current NVS schema version
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// NVS namespace for synthesizer settings
pub const NVS_NAMESPACE: &str = "dac_synth";

/// NVS keys (max 15 chars)
pub mod nvs_keys {
    pub const VERSION: &str = "schema_ver";
    pub const FREQUENCY: &str = "freq_bits";
    pub const AMPLITUDE: &str = "amp_bits";
    pub const SAMPLES: &str = "samples";
}

/// Load result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadResult {
    /// Nothing stored yet, defaults kept
    FreshInstall,
    /// Stored settings loaded
    UpToDate,
}

/// NVS operation errors
#[derive(Debug)]
pub enum NvsError {
    /// Opening the namespace failed
    #[cfg(target_os = "espidf")]
    InitFailed(EspError),
    /// NVS read/write error
    #[cfg(target_os = "espidf")]
    IoError(EspError),
    /// Schema version too new (downgrade not supported)
    TooNew { stored_version: u32 },
    /// Feature not available on this platform
    #[cfg(not(target_os = "espidf"))]
    NotAvailable,
}

#[cfg(target_os = "espidf")]
impl From<EspError> for NvsError {
    fn from(e: EspError) -> Self {
        NvsError::IoError(e)
    }
}

impl core::fmt::Display for NvsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            #[cfg(target_os = "espidf")]
            NvsError::InitFailed(e) => write!(f, "nvs open failed: {}", e),
            #[cfg(target_os = "espidf")]
            NvsError::IoError(e) => write!(f, "nvs io: {}", e),
            NvsError::TooNew { stored_version } => {
                write!(f, "nvs schema v{} newer than v{}", stored_version, CURRENT_SCHEMA_VERSION)
            }
            #[cfg(not(target_os = "espidf"))]
            NvsError::NotAvailable => write!(f, "nvs not available"),
        }
    }
}

/// Decide what to do with a stored schema version.
pub fn check_schema(stored_version: u32) -> Result<LoadResult, NvsError> {
    match stored_version.cmp(&CURRENT_SCHEMA_VERSION) {
        Ordering::Equal => Ok(LoadResult::UpToDate),
        // 0 = key missing; there is no older schema to migrate from yet
        Ordering::Less => Ok(LoadResult::FreshInstall),
        Ordering::Greater => Err(NvsError::TooNew { stored_version }),
    }
}

/// Load settings from NVS into `config`.
///
/// Values are stored raw; `SynthConfig::load` validates them.
#[cfg(target_os = "espidf")]
pub fn load_from_nvs(
    partition: &EspDefaultNvsPartition,
    config: &SynthConfig,
) -> Result<LoadResult, NvsError> {
    let storage = open(partition)?;

    let stored_version = storage.get_u32(nvs_keys::VERSION)?.unwrap_or(0);
    let result = check_schema(stored_version)?;

    if result == LoadResult::UpToDate {
        let freq = storage.get_u32(nvs_keys::FREQUENCY)?.map(f32::from_bits);
        let amp = storage.get_u32(nvs_keys::AMPLITUDE)?.map(f32::from_bits);
        let samples = storage.get_u32(nvs_keys::SAMPLES)?;
        config.set_raw(
            freq.unwrap_or(config.frequency()),
            amp.unwrap_or(config.amplitude()),
            samples.unwrap_or(config.sample_count()),
        );
    }

    Ok(result)
}

/// Stub for non-ESP platforms
#[cfg(not(target_os = "espidf"))]
pub fn load_from_nvs(_config: &SynthConfig) -> Result<LoadResult, NvsError> {
    Err(NvsError::NotAvailable)
}

/// Save settings to NVS with version stamp
#[cfg(target_os = "espidf")]
pub fn save_to_nvs(partition: &EspDefaultNvsPartition, config: &SynthConfig) -> Result<(), NvsError> {
    let mut storage = open(partition)?;

    storage.set_u32(nvs_keys::VERSION, CURRENT_SCHEMA_VERSION)?;
    storage.set_u32(nvs_keys::FREQUENCY, config.frequency().to_bits())?;
    storage.set_u32(nvs_keys::AMPLITUDE, config.amplitude().to_bits())?;
    storage.set_u32(nvs_keys::SAMPLES, config.sample_count())?;

    Ok(())
}

/// Stub for non-ESP platforms
#[cfg(not(target_os = "espidf"))]
pub fn save_to_nvs(_config: &SynthConfig) -> Result<(), NvsError> {
    Err(NvsError::NotAvailable)
}

#[cfg(target_os = "espidf")]
fn open(partition: &EspDefaultNvsPartition) -> Result<EspNvs<NvsDefault>, NvsError> {
    EspNvs::new(partition.clone(), NVS_NAMESPACE, true).map_err(NvsError::InitFailed)
}
