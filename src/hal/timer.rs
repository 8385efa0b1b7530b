//! esp_timer periodic source.
//!
//! Uses the esp_timer task dispatch: the callback runs in the high-priority
//! esp_timer task, not a raw ISR, so the LEDC driver call in the tick is
//! allowed. Period resolution is 1 µs.

use core::time::Duration;

use esp_idf_svc::timer::{EspTaskTimerService, EspTimer};

use super::{PeriodicTimer, TickHandler};
use crate::config::MIN_TICK_INTERVAL_US;
use crate::error::SynthError;

/// Periodic source backed by one esp_timer.
pub struct EspTickTimer {
    service: EspTaskTimerService,
    active: Option<EspTimer<'static>>,
}

impl EspTickTimer {
    pub fn new(service: EspTaskTimerService) -> Self {
        Self { service, active: None }
    }
}

impl PeriodicTimer for EspTickTimer {
    fn schedule(
        &mut self,
        interval_us: f32,
        handler: &'static (dyn TickHandler + Sync),
    ) -> Result<(), SynthError> {
        // Dropping the old EspTimer stops and deletes it before the new one starts
        self.cancel();

        let timer = self
            .service
            .timer(move || handler.on_tick())
            .map_err(|_| SynthError::Timer)?;
        let period = Duration::from_nanos((interval_us as f64 * 1000.0) as u64);
        timer.every(period).map_err(|_| SynthError::Timer)?;

        self.active = Some(timer);
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(timer) = self.active.take() {
            let _ = timer.cancel();
        }
    }

    fn is_armed(&self) -> bool {
        self.active.is_some()
    }

    fn now_us(&self) -> i64 {
        self.service.now().as_micros() as i64
    }

    /// esp_timer below ~50 µs starves the system task at 240 MHz.
    fn min_interval_us(&self) -> f32 {
        MIN_TICK_INTERVAL_US
    }
}
