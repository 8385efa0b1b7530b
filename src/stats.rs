//! Playback statistics.
//!
//! Lock-free counters updated from both contexts: the tick handler bumps
//! `ticks` and `cursor_races`, the foreground bumps `publishes` and
//! `clamped`. Read from the console with [`PlaybackStats::snapshot`].

use core::sync::atomic::{AtomicU16, AtomicU32, Ordering};

/// Counters shared between the foreground and the tick context.
pub struct PlaybackStats {
    /// Ticks that emitted a sample.
    ticks: AtomicU32,

    /// Tables published by `start()`.
    publishes: AtomicU32,

    /// Ticks whose cursor update collided with a concurrent reset or tick.
    /// Each one may have shifted the phase by one sample.
    cursor_races: AtomicU32,

    /// Samples clamped into range across all synthesized tables.
    clamped: AtomicU32,

    /// Last level written to the output (rest level included).
    last_level: AtomicU16,
}

impl PlaybackStats {
    /// All counters at zero.
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
            publishes: AtomicU32::new(0),
            cursor_races: AtomicU32::new(0),
            clamped: AtomicU32::new(0),
            last_level: AtomicU16::new(0),
        }
    }

    /// Tick path: a sample was emitted.
    #[inline]
    pub fn record_tick(&self, level: u16) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.last_level.store(level, Ordering::Relaxed);
    }

    /// Tick path: cursor compare-exchange lost.
    #[inline]
    pub fn record_cursor_race(&self) {
        self.cursor_races.fetch_add(1, Ordering::Relaxed);
    }

    /// Foreground: a table was published.
    #[inline]
    pub fn record_publish(&self, clamped: usize) {
        self.publishes.fetch_add(1, Ordering::Relaxed);
        self.clamped.fetch_add(clamped as u32, Ordering::Relaxed);
    }

    /// Foreground: the output was parked at `level`.
    #[inline]
    pub fn record_rest(&self, level: u16) {
        self.last_level.store(level, Ordering::Relaxed);
    }

    #[inline]
    pub fn ticks(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn cursor_races(&self) -> u32 {
        self.cursor_races.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all counters.
    ///
    /// Fields are read one by one; under load they may be a few ticks apart.
    #[inline]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            ticks: self.ticks(),
            publishes: self.publishes.load(Ordering::Relaxed),
            cursor_races: self.cursor_races(),
            clamped: self.clamped.load(Ordering::Relaxed),
            last_level: self.last_level.load(Ordering::Relaxed),
        }
    }
}

impl Default for PlaybackStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of playback statistics at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub ticks: u32,
    pub publishes: u32,
    pub cursor_races: u32,
    pub clamped: u32,
    pub last_level: u16,
}
