//! LEDC PWM output as the analog channel.
//!
//! The ESP32-S3 has no DAC, so the table drives a 12-bit LEDC channel
//! followed by an RC low-pass:
//!
//! ```text
//! GPIO ──[1 kΩ]──┬──▶ output
//!              [100 nF]
//!                │
//!               GND
//! ```
//!
//! PWM carrier = 80 MHz / 2^12 ≈ 19.5 kHz, well above the synthesized tone
//! for the table lengths the firmware uses.

use core::cell::UnsafeCell;

use esp_idf_svc::hal::ledc::LedcDriver;
use esp_idf_svc::hal::task::CriticalSection;

use super::DacOutput;

/// LEDC channel behind the [`DacOutput`] trait.
pub struct LedcDac {
    driver: UnsafeCell<LedcDriver<'static>>,
    /// Guards `driver` between the timer task and the foreground.
    cs: CriticalSection,
    /// Left shift from requested resolution to hardware resolution.
    shift: UnsafeCell<u32>,
    hw_bits: u32,
}

// SAFETY: every access to the UnsafeCells happens inside `cs`.
unsafe impl Sync for LedcDac {}
unsafe impl Send for LedcDac {}

impl LedcDac {
    /// Wrap a configured driver; its timer resolution is the hardware one.
    pub fn new(driver: LedcDriver<'static>) -> Self {
        let hw_bits = 32 - (driver.get_max_duty() + 1).leading_zeros() - 1;
        Self {
            driver: UnsafeCell::new(driver),
            cs: CriticalSection::new(),
            shift: UnsafeCell::new(0),
            hw_bits,
        }
    }
}

impl DacOutput for LedcDac {
    /// Levels arrive at `bits`; scale up to the hardware resolution.
    fn configure_resolution(&self, bits: u8) {
        let _guard = self.cs.enter();
        // SAFETY: inside the critical section
        unsafe {
            *self.shift.get() = self.hw_bits.saturating_sub(bits as u32);
        }
    }

    #[inline]
    fn write_sample(&self, level: u16) {
        let _guard = self.cs.enter();
        // SAFETY: inside the critical section
        unsafe {
            let duty = (level as u32) << *self.shift.get();
            let _ = (*self.driver.get()).set_duty(duty);
        }
    }
}
