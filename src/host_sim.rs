//! Host simulation: the same engine on a thread-driven tick.
//!
//! The "DAC" only remembers its last level, which `stats` reports.

use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use dac_synth::{
    DacOutput, PeriodicTimer, Playback, PlaybackEngine, SynthError, TickHandler, CONFIG,
    LOG_STREAM,
};
use dac_synth::config::MIN_TICK_INTERVAL_US;
use dac_synth::rt_error;

use super::serve_console;

/// Output that latches the last level.
pub struct SimDac {
    bits: AtomicU8,
    level: AtomicU16,
}

impl SimDac {
    pub const fn new() -> Self {
        Self {
            bits: AtomicU8::new(0),
            level: AtomicU16::new(0),
        }
    }
}

impl DacOutput for SimDac {
    fn configure_resolution(&self, bits: u8) {
        self.bits.store(bits, Ordering::Relaxed);
    }

    fn write_sample(&self, level: u16) {
        self.level.store(level, Ordering::Relaxed);
    }
}

/// Periodic source on a dedicated thread.
pub struct ThreadTimer {
    epoch: Instant,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ThreadTimer {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

impl PeriodicTimer for ThreadTimer {
    fn schedule(
        &mut self,
        interval_us: f32,
        handler: &'static (dyn TickHandler + Sync),
    ) -> Result<(), SynthError> {
        self.cancel();

        let period = Duration::from_nanos((interval_us as f64 * 1000.0) as u64);
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let worker = thread::Builder::new()
            .name("tick".into())
            .spawn(move || {
                let mut next = Instant::now() + period;
                while flag.load(Ordering::Acquire) {
                    handler.on_tick();
                    // Parked rather than slept so cancel() can wake us early
                    while flag.load(Ordering::Acquire) {
                        match next.checked_duration_since(Instant::now()) {
                            Some(wait) if !wait.is_zero() => thread::park_timeout(wait),
                            _ => break,
                        }
                    }
                    next += period;
                }
            })
            .map_err(|_| SynthError::Timer)?;

        self.running = running;
        self.worker = Some(worker);
        Ok(())
    }

    fn cancel(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            worker.thread().unpark();
            let _ = worker.join();
        }
    }

    fn is_armed(&self) -> bool {
        self.worker.is_some()
    }

    fn now_us(&self) -> i64 {
        self.epoch.elapsed().as_micros() as i64
    }

    fn min_interval_us(&self) -> f32 {
        MIN_TICK_INTERVAL_US
    }
}

static PLAYBACK: Playback<SimDac> = Playback::new(SimDac::new());

pub fn run() -> ! {
    let mut engine = PlaybackEngine::new(&PLAYBACK, ThreadTimer::new());
    engine.begin();
    engine.set_params(CONFIG.load());
    if let Err(e) = engine.start_continuous() {
        rt_error!(LOG_STREAM, engine.timer().now_us(), "boot start failed: {}", e);
    }

    serve_console(&mut engine, |out: &mut dyn Write| {
        let _ = writeln!(out, "save: no flash on host");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    struct Counter(AtomicU32);

    impl TickHandler for Counter {
        fn on_tick(&self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_cancel_wakes_a_long_wait() {
        static TICKS: Counter = Counter(AtomicU32::new(0));

        let mut timer = ThreadTimer::new();
        // Ten seconds between ticks
        timer.schedule(10_000_000.0, &TICKS).unwrap();
        thread::sleep(Duration::from_millis(20));

        let begun = Instant::now();
        timer.cancel();
        assert!(begun.elapsed() < Duration::from_secs(1));
        assert!(!timer.is_armed());
        assert_eq!(TICKS.0.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_short_period_keeps_ticking() {
        static TICKS: Counter = Counter(AtomicU32::new(0));

        let mut timer = ThreadTimer::new();
        timer.schedule(1_000.0, &TICKS).unwrap();
        thread::sleep(Duration::from_millis(50));
        timer.cancel();

        let ticks = TICKS.0.load(Ordering::Relaxed);
        assert!(ticks >= 5, "only {} ticks", ticks);
        thread::sleep(Duration::from_millis(10));
        assert_eq!(TICKS.0.load(Ordering::Relaxed), ticks);
    }
}
