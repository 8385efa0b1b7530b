//! ESP32 bring-up: NVS, LEDC output, esp_timer tick.

use std::fmt::Write;

use esp_idf_svc::hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::FromValueType;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::EspError;
use esp_idf_svc::timer::EspTaskTimerService;

use dac_synth::config::nvs::{load_from_nvs, save_to_nvs};
use dac_synth::hal::{EspTickTimer, LedcDac};
use dac_synth::{Playback, PlaybackEngine, CONFIG, LOG_STREAM};
use dac_synth::{rt_error, rt_info, rt_warn};

use super::serve_console;

/// LEDC carrier: 80 MHz APB / 2^12
const PWM_FREQUENCY_HZ: u32 = 19_531;

pub fn run() -> Result<(), EspError> {
    let peripherals = Peripherals::take()?;
    let timer_service = EspTaskTimerService::new()?;
    let now = || timer_service.now().as_micros() as i64;

    let nvs = EspDefaultNvsPartition::take()?;
    match load_from_nvs(&nvs, &CONFIG) {
        Ok(result) => rt_info!(LOG_STREAM, now(), "settings: {:?}", result),
        Err(e) => rt_warn!(LOG_STREAM, now(), "settings not loaded: {}", e),
    }

    let ledc_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::default()
            .frequency(PWM_FREQUENCY_HZ.Hz())
            .resolution(Resolution::Bits12),
    )?;
    let driver = LedcDriver::new(peripherals.ledc.channel0, ledc_timer, peripherals.pins.gpio17)?;

    // The timer callback holds a &'static to the bank for the life of the firmware
    let playback: &'static Playback<LedcDac> = Box::leak(Box::new(Playback::new(LedcDac::new(driver))));

    let mut engine = PlaybackEngine::new(playback, EspTickTimer::new(timer_service.clone()));
    engine.begin();
    engine.set_params(CONFIG.load());
    if let Err(e) = engine.start_continuous() {
        rt_error!(LOG_STREAM, now(), "boot start failed: {}", e);
    }

    serve_console(&mut engine, |out: &mut dyn Write| match save_to_nvs(&nvs, &CONFIG) {
        Ok(()) => {
            let _ = writeln!(out, "saved");
        }
        Err(e) => {
            let _ = writeln!(out, "save failed: {}", e);
        }
    })
}
