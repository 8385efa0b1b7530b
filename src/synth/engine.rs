//! Playback engine state machine.
//!
//! ```text
//!            begin()
//!              │
//!              ▼
//!   ┌──────▶ Idle ──start()──────────────▶ Running(Manual)
//!   │          │                               │  update() = one tick
//!   │          └─start_continuous()──▶ Running(Continuous)
//!   │                                          │  timer = one tick per interval
//!   └──────────────── stop() / failed start ◀──┘
//! ```

use super::params::{check_interval, check_sample_count, WaveformParameters};
use super::playback::Playback;
use super::table::{interval_us, OutputSpec, WaveformTable};
use super::SynthControl;
use crate::config::{DEFAULT_SAMPLE_COUNT, REST_LEVEL, TABLE_CAPACITY};
use crate::error::SynthError;
use crate::hal::{DacOutput, PeriodicTimer};
use crate::log_globals::LOG_STREAM;
use crate::logging::LogStream;
use crate::stats::StatsSnapshot;
use crate::{rt_debug, rt_error, rt_info, rt_warn};

/// How ticks are delivered while running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Caller steps with `update()`
    Manual,
    /// Periodic source ticks at the table interval
    Continuous,
}

/// Engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running(PlaybackMode),
}

/// Owns the parameters, the timer and the Idle/Running state.
///
/// The tables and cursor live in the shared [`Playback`] so the periodic
/// source can reach them.
pub struct PlaybackEngine<O, T, const N: usize = TABLE_CAPACITY>
where
    O: DacOutput + Sync + 'static,
    T: PeriodicTimer,
{
    playback: &'static Playback<O, N>,
    timer: T,
    spec: OutputSpec,
    params: WaveformParameters,
    state: EngineState,
    initialized: bool,
    log: &'static LogStream,
}

impl<O, T, const N: usize> PlaybackEngine<O, T, N>
where
    O: DacOutput + Sync + 'static,
    T: PeriodicTimer,
{
    /// Engine over `playback`, driven by `timer`. Call [`begin`](Self::begin) next.
    pub fn new(playback: &'static Playback<O, N>, timer: T) -> Self {
        Self {
            playback,
            timer,
            spec: OutputSpec::DEFAULT,
            params: WaveformParameters::new(),
            state: EngineState::Idle,
            initialized: false,
            log: &LOG_STREAM,
        }
    }

    /// Target a different output resolution/reference.
    pub fn with_output_spec(mut self, spec: OutputSpec) -> Self {
        self.spec = spec;
        self
    }

    /// Log to `log` instead of the global stream.
    pub fn with_log(mut self, log: &'static LogStream) -> Self {
        self.log = log;
        self
    }

    /// One-time setup: output resolution, cursor, default table length.
    pub fn begin(&mut self) {
        self.playback.output().configure_resolution(self.spec.resolution_bits);
        self.playback.rewind();
        // Playback::new guarantees N >= 1
        self.params.restore_sample_count(DEFAULT_SAMPLE_COUNT.min(N));
        self.state = EngineState::Idle;
        self.initialized = true;
        rt_info!(
            self.log,
            self.timer.now_us(),
            "begin: {}-bit output, capacity {}",
            self.spec.resolution_bits,
            N
        );
    }

    // --- Configuration (effective on next start) ---

    pub fn set_frequency(&mut self, hz: f32) -> Result<(), SynthError> {
        self.params.set_frequency(hz)
    }

    pub fn set_amplitude(&mut self, volts: f32) -> Result<(), SynthError> {
        self.params.set_amplitude(volts)
    }

    /// Rejects counts above this engine's capacity as well as the global one.
    pub fn set_sample_count(&mut self, n: usize) -> Result<(), SynthError> {
        check_sample_count(n, N)?;
        self.params.set_sample_count(n)
    }

    /// Replace all three parameters (e.g. from persisted config).
    ///
    /// Capacity is checked at the next start.
    pub fn set_params(&mut self, params: WaveformParameters) {
        let interval = self.params.derived_interval();
        self.params = params;
        self.params.record_interval(interval);
    }

    #[inline]
    pub fn params(&self) -> &WaveformParameters {
        &self.params
    }

    #[inline]
    pub fn output_spec(&self) -> &OutputSpec {
        &self.spec
    }

    // --- Lifecycle ---

    /// Synthesize and publish the table, rewind, mark running.
    ///
    /// Does not arm the periodic source. If it is already armed, ticks move
    /// to the new table at the old period until `start_continuous()`.
    pub fn start(&mut self) -> Result<(), SynthError> {
        self.launch(0.0).map(|_| ())
    }

    /// `start()`, then arm the periodic source at the table interval.
    ///
    /// The interval is checked against the source's minimum before the
    /// table is published.
    pub fn start_continuous(&mut self) -> Result<(), SynthError> {
        let min_interval_us = self.timer.min_interval_us();
        let interval = self.launch(min_interval_us)?;

        self.timer.cancel();
        if let Err(e) = self.timer.schedule(interval, self.playback) {
            return Err(self.fail(e));
        }

        self.state = EngineState::Running(PlaybackMode::Continuous);
        rt_debug!(self.log, self.timer.now_us(), "timer armed at {} us", interval);
        Ok(())
    }

    /// Run one tick synchronously. No-op while nothing is published.
    #[inline]
    pub fn update(&mut self) {
        self.playback.tick();
    }

    /// Cancel the periodic source, park the output at rest, go idle.
    pub fn stop(&mut self) {
        self.timer.cancel();
        self.playback.halt(REST_LEVEL);
        let was_running = self.is_running();
        self.state = EngineState::Idle;
        if was_running {
            rt_info!(self.log, self.timer.now_us(), "stopped");
        }
    }

    // --- Status ---

    #[inline]
    pub fn is_running(&self) -> bool {
        matches!(self.state, EngineState::Running(_))
    }

    #[inline]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Interval of the last successful start, 0 before.
    #[inline]
    pub fn interval(&self) -> f32 {
        self.params.derived_interval()
    }

    /// Index of the last emitted sample.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.playback.cursor()
    }

    #[inline]
    pub fn stats(&self) -> StatsSnapshot {
        self.playback.stats().snapshot()
    }

    /// Read the published table.
    pub fn with_table<R>(&self, f: impl FnOnce(&WaveformTable<N>) -> R) -> R {
        self.playback.with_table(f)
    }

    #[inline]
    pub fn timer(&self) -> &T {
        &self.timer
    }

    #[inline]
    pub fn output(&self) -> &O {
        self.playback.output()
    }

    /// Validate, publish, rewind. Nothing is written unless every check passes.
    fn launch(&mut self, min_interval_us: f32) -> Result<f32, SynthError> {
        if !self.initialized {
            return Err(self.fail(SynthError::NotInitialized));
        }

        let n = self.params.sample_count();
        let planned = check_sample_count(n, N)
            .and_then(|()| check_interval(interval_us(self.params.frequency(), n), min_interval_us));
        if let Err(e) = planned {
            return Err(self.fail(e));
        }

        let interval = match self.playback.publish(&self.params, &self.spec) {
            Ok(interval) => interval,
            Err(e) => return Err(self.fail(e)),
        };
        self.params.record_interval(interval);

        let clamped = self.playback.with_table(|t| t.clamped());
        if clamped > 0 {
            rt_warn!(self.log, self.timer.now_us(), "{} samples clamped to output range", clamped);
        }

        let mode = if self.timer.is_armed() {
            PlaybackMode::Continuous
        } else {
            PlaybackMode::Manual
        };
        self.state = EngineState::Running(mode);

        rt_info!(
            self.log,
            self.timer.now_us(),
            "START interval = {} us ({} Hz, {} V, {} samples)",
            interval,
            self.params.frequency(),
            self.params.amplitude(),
            self.params.sample_count()
        );
        Ok(interval)
    }

    /// Revert to Idle with the output at rest, log, hand the error back.
    fn fail(&mut self, err: SynthError) -> SynthError {
        self.timer.cancel();
        self.playback.halt(REST_LEVEL);
        self.state = EngineState::Idle;
        rt_error!(self.log, self.timer.now_us(), "start rejected: {}", err);
        err
    }
}

impl<O, T, const N: usize> SynthControl for PlaybackEngine<O, T, N>
where
    O: DacOutput + Sync + 'static,
    T: PeriodicTimer,
{
    fn params(&self) -> WaveformParameters {
        self.params
    }

    fn set_frequency(&mut self, hz: f32) -> Result<(), SynthError> {
        PlaybackEngine::set_frequency(self, hz)
    }

    fn set_amplitude(&mut self, volts: f32) -> Result<(), SynthError> {
        PlaybackEngine::set_amplitude(self, volts)
    }

    fn set_sample_count(&mut self, n: usize) -> Result<(), SynthError> {
        PlaybackEngine::set_sample_count(self, n)
    }

    fn start(&mut self) -> Result<(), SynthError> {
        PlaybackEngine::start(self)
    }

    fn start_continuous(&mut self) -> Result<(), SynthError> {
        PlaybackEngine::start_continuous(self)
    }

    fn update(&mut self) {
        PlaybackEngine::update(self)
    }

    fn stop(&mut self) {
        PlaybackEngine::stop(self)
    }

    fn state(&self) -> EngineState {
        self.state
    }

    fn interval(&self) -> f32 {
        PlaybackEngine::interval(self)
    }

    fn stats(&self) -> StatsSnapshot {
        PlaybackEngine::stats(self)
    }
}
