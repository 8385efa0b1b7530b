//! Double-buffered playback bank shared with the tick context.
//!
//! # Architecture
//!
//! ```text
//! Foreground (start/stop)          Tick context (timer or update())
//! ───────────────────────          ────────────────────────────────
//! synthesize ──▶ [shadow table]
//!                     │ publish: one atomic store
//!                     ▼
//!                [active table] ──▶ cursor+1 mod len ──▶ write_sample
//! ```
//!
//! - The tick only ever reads the published table.
//! - The foreground only ever writes the table that is not published.
//! - A per-table reader count tells the foreground when an in-flight tick
//!   that grabbed a table before the last swap has left it.
//! - The tick never waits. The foreground waits at most one tick, and
//!   never on a single core where the tick preempts it completely.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use super::params::WaveformParameters;
use super::table::{synthesize_into, OutputSpec, WaveformTable};
use crate::config::{REST_LEVEL, TABLE_CAPACITY};
use crate::error::SynthError;
use crate::hal::{DacOutput, TickHandler};
use crate::stats::PlaybackStats;

/// Table storage, cursor and output shared by foreground and tick.
///
/// Lives in a `static` (or is leaked) so the periodic source can hold a
/// `&'static` to it. Exactly one [`PlaybackEngine`](super::PlaybackEngine)
/// may drive a given `Playback`.
pub struct Playback<O, const N: usize = TABLE_CAPACITY> {
    tables: [UnsafeCell<WaveformTable<N>>; 2],

    /// Index of the published table.
    active: AtomicU8,

    /// Ticks currently reading each table.
    readers: [AtomicU8; 2],

    /// Index of the last emitted sample in the published table.
    cursor: AtomicUsize,

    /// False until the first publish and after `halt()`: ticks are no-ops.
    enabled: AtomicBool,

    output: O,
    stats: PlaybackStats,
}

// SAFETY: Tables are only written by the single foreground owner, and only
// the unpublished one, after its reader count has drained to zero. Ticks
// only read the published table while holding a reader count. All other
// shared state is atomic. The output is required to be Sync.
unsafe impl<O: Sync, const N: usize> Sync for Playback<O, N> {}

impl<O: DacOutput, const N: usize> Playback<O, N> {
    /// Create an idle bank around `output`.
    ///
    /// Panics if `N == 0`; in a `static` that is a compile error.
    pub const fn new(output: O) -> Self {
        assert!(N > 0, "Playback table capacity must be at least 1");
        Self {
            tables: [
                UnsafeCell::new(WaveformTable::new()),
                UnsafeCell::new(WaveformTable::new()),
            ],
            active: AtomicU8::new(0),
            readers: [AtomicU8::new(0), AtomicU8::new(0)],
            cursor: AtomicUsize::new(0),
            enabled: AtomicBool::new(false),
            output,
            stats: PlaybackStats::new(),
        }
    }

    /// The analog output this bank drives.
    #[inline]
    pub fn output(&self) -> &O {
        &self.output
    }

    #[inline]
    pub fn stats(&self) -> &PlaybackStats {
        &self.stats
    }

    /// Index of the last emitted sample.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// True while ticks emit samples.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Advance the cursor and emit one sample.
    ///
    /// No-op while nothing is published. Bounded, lock-free, infallible.
    #[inline]
    pub fn tick(&self) {
        let Some(bank) = self.acquire() else {
            return;
        };

        // SAFETY: reader count for `bank` is held, so the foreground will
        // not write this table until `release`.
        let table = unsafe { &*self.tables[bank].get() };

        // Published tables always have len >= 1.
        let len = table.len().max(1);
        let current = self.cursor.load(Ordering::Acquire);
        let next = (current + 1) % len;
        if self
            .cursor
            .compare_exchange(current, next, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            self.stats.record_cursor_race();
        }

        let level = table.get(next).unwrap_or(REST_LEVEL);
        self.output.write_sample(level);
        self.stats.record_tick(level);

        self.release(bank);
    }

    /// Synthesize `params` into the shadow table and publish it.
    ///
    /// On error nothing is written and the published table is unchanged.
    /// Returns the new tick interval.
    pub(crate) fn publish(
        &self,
        params: &WaveformParameters,
        spec: &OutputSpec,
    ) -> Result<f32, SynthError> {
        let shadow = (self.active.load(Ordering::SeqCst) ^ 1) as usize;
        self.wait_for_readers(shadow);

        // SAFETY: `shadow` is not published, so no new tick can start
        // reading it, and its reader count is zero, so none is still
        // reading it from before the last swap. Single foreground writer.
        let table = unsafe { &mut *self.tables[shadow].get() };
        synthesize_into(params, spec, table)?;
        let interval_us = table.interval_us();
        self.stats.record_publish(table.clamped());

        self.active.store(shadow as u8, Ordering::SeqCst);
        self.cursor.store(0, Ordering::SeqCst);
        self.enabled.store(true, Ordering::SeqCst);
        Ok(interval_us)
    }

    /// Stop emitting samples and park the output at `level`.
    ///
    /// Waits for in-flight ticks to finish so nothing is written after the
    /// rest level.
    pub(crate) fn halt(&self, level: u16) {
        self.enabled.store(false, Ordering::SeqCst);
        self.wait_for_readers(0);
        self.wait_for_readers(1);
        self.output.write_sample(level);
        self.stats.record_rest(level);
    }

    /// Reset the cursor to the start of the table.
    pub(crate) fn rewind(&self) {
        self.cursor.store(0, Ordering::SeqCst);
    }

    /// Run `f` on the published table.
    ///
    /// Foreground only: the published table is never written while it is
    /// published, and only the foreground publishes.
    pub(crate) fn with_table<R>(&self, f: impl FnOnce(&WaveformTable<N>) -> R) -> R {
        let bank = self.active.load(Ordering::SeqCst) as usize;
        // SAFETY: see above; reads only.
        f(unsafe { &*self.tables[bank].get() })
    }

    /// Take a reader count on the published table, `None` if disabled.
    ///
    /// Retries only if the foreground swapped tables between the two loads,
    /// which happens at most once per publish.
    #[inline]
    fn acquire(&self) -> Option<usize> {
        loop {
            if !self.enabled.load(Ordering::SeqCst) {
                return None;
            }
            let bank = self.active.load(Ordering::SeqCst) as usize;
            self.readers[bank].fetch_add(1, Ordering::SeqCst);
            if self.active.load(Ordering::SeqCst) as usize == bank
                && self.enabled.load(Ordering::SeqCst)
            {
                return Some(bank);
            }
            self.readers[bank].fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[inline]
    fn release(&self, bank: usize) {
        self.readers[bank].fetch_sub(1, Ordering::SeqCst);
    }

    fn wait_for_readers(&self, bank: usize) {
        while self.readers[bank].load(Ordering::SeqCst) != 0 {
            core::hint::spin_loop();
        }
    }
}

impl<O: DacOutput, const N: usize> TickHandler for Playback<O, N> {
    #[inline]
    fn on_tick(&self) {
        self.tick();
    }
}
