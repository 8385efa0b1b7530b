//! Shared test doubles: recording output, hand-fired timer, text sink.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU8, Ordering};
use std::sync::Mutex;

use dac_synth::logging::LogStream;
use dac_synth::{DacOutput, PeriodicTimer, Playback, PlaybackEngine, SynthError, TickHandler};

/// Output that records every level written.
pub struct MockDac {
    bits: AtomicU8,
    levels: Mutex<Vec<u16>>,
}

impl MockDac {
    pub fn new() -> Self {
        Self {
            bits: AtomicU8::new(0),
            levels: Mutex::new(Vec::new()),
        }
    }

    pub fn bits(&self) -> u8 {
        self.bits.load(Ordering::SeqCst)
    }

    pub fn levels(&self) -> Vec<u16> {
        self.levels.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<u16> {
        self.levels.lock().unwrap().last().copied()
    }

    pub fn clear(&self) {
        self.levels.lock().unwrap().clear();
    }
}

impl DacOutput for MockDac {
    fn configure_resolution(&self, bits: u8) {
        self.bits.store(bits, Ordering::SeqCst);
    }

    fn write_sample(&self, level: u16) {
        self.levels.lock().unwrap().push(level);
    }
}

/// Periodic source fired by hand with [`MockTimer::fire`].
pub struct MockTimer {
    handler: Option<&'static (dyn TickHandler + Sync)>,
    interval_us: f32,
    min_interval_us: f32,
    schedules: u32,
    cancels: AtomicU32,
    refuse: AtomicBool,
    clock: AtomicI64,
}

impl MockTimer {
    pub fn new() -> Self {
        Self {
            handler: None,
            interval_us: 0.0,
            min_interval_us: 1.0,
            schedules: 0,
            cancels: AtomicU32::new(0),
            refuse: AtomicBool::new(false),
            clock: AtomicI64::new(0),
        }
    }

    /// Timer that cannot go faster than `us`.
    pub fn with_min_interval(mut self, us: f32) -> Self {
        self.min_interval_us = us;
        self
    }

    /// Timer whose `schedule` always fails.
    pub fn refusing() -> Self {
        let timer = Self::new();
        timer.refuse.store(true, Ordering::SeqCst);
        timer
    }

    /// Deliver `n` ticks if armed. Returns false when nothing is scheduled.
    pub fn fire(&self, n: usize) -> bool {
        match self.handler {
            Some(handler) => {
                for _ in 0..n {
                    handler.on_tick();
                }
                true
            }
            None => false,
        }
    }

    pub fn interval_us(&self) -> f32 {
        self.interval_us
    }

    pub fn schedules(&self) -> u32 {
        self.schedules
    }

    pub fn cancels(&self) -> u32 {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl PeriodicTimer for MockTimer {
    fn schedule(
        &mut self,
        interval_us: f32,
        handler: &'static (dyn TickHandler + Sync),
    ) -> Result<(), SynthError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(SynthError::Timer);
        }
        self.handler = Some(handler);
        self.interval_us = interval_us;
        self.schedules += 1;
        Ok(())
    }

    fn cancel(&mut self) {
        self.handler = None;
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }

    fn is_armed(&self) -> bool {
        self.handler.is_some()
    }

    fn now_us(&self) -> i64 {
        self.clock.fetch_add(1, Ordering::SeqCst)
    }

    fn min_interval_us(&self) -> f32 {
        self.min_interval_us
    }
}

pub type TestEngine<const N: usize = 4096> = PlaybackEngine<MockDac, MockTimer, N>;

/// Bank with a `'static` lifetime, as the timer callback requires.
pub fn leak_playback<const N: usize>() -> &'static Playback<MockDac, N> {
    Box::leak(Box::new(Playback::new(MockDac::new())))
}

/// Private log stream so tests do not share the global one.
pub fn leak_log() -> &'static LogStream {
    Box::leak(Box::new(LogStream::new()))
}

/// Engine after `begin()`, with its own bank and log.
pub fn engine<const N: usize>() -> TestEngine<N> {
    engine_with_timer(MockTimer::new())
}

pub fn engine_with_timer<const N: usize>(timer: MockTimer) -> TestEngine<N> {
    let mut engine = PlaybackEngine::new(leak_playback::<N>(), timer).with_log(leak_log());
    engine.begin();
    engine
}

/// Collects console output.
#[derive(Default)]
pub struct TestOutput {
    pub text: String,
}

impl TestOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, s: &str) -> bool {
        self.text.contains(s)
    }

    pub fn lines(&self) -> Vec<&str> {
        self.text.lines().collect()
    }
}

impl core::fmt::Write for TestOutput {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.text.push_str(s);
        Ok(())
    }
}
