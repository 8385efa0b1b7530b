//! Non-blocking log ring for DacSynth.
//!
//! ```text
//! engine / console        LogStream<N>          firmware loop
//!  rt_info!(..) ──fmt──▶ [e0][e1]..[eN-1] ──▶ drain_to(serial)
//!  (stack buffer)         CAS-claimed slots     single reader
//! ```
//!
//! Producers format into a fixed stack buffer, claim a slot by advancing
//! `write_idx` with a compare-exchange, fill it, then mark it ready. A full
//! ring drops the entry and counts it without claiming anything. The drain
//! stops at the first claimed slot that is not ready yet. Entries below the
//! stream's threshold are skipped before any formatting happens.
//!
//! The tick handler never logs; everything it has to say goes through
//! [`PlaybackStats`](crate::stats::PlaybackStats).

use core::cell::UnsafeCell;
use core::fmt::Write;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Longest message kept; longer ones are cut.
pub const MAX_MSG_LEN: usize = 96;

/// Default ring depth.
pub const LOG_BUFFER_SIZE: usize = 64;

/// Severity, most severe first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    const ALL: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    /// Parse a level name, any case (`"warn"`, `"DEBUG"`).
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|l| l.as_str().eq_ignore_ascii_case(name))
    }

    fn from_u8(raw: u8) -> Self {
        Self::ALL.get(raw as usize).copied().unwrap_or(LogLevel::Trace)
    }
}

/// One queued message.
#[derive(Clone, Copy)]
pub struct LogEntry {
    /// Producer clock, microseconds.
    pub timestamp_us: i64,
    pub level: LogLevel,
    pub len: u8,
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const EMPTY: Self = Self {
        timestamp_us: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text. A cut inside a multi-byte char drops the partial char.
    pub fn message(&self) -> &str {
        let bytes = &self.msg[..self.len as usize];
        match core::str::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or(""),
        }
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[allow(clippy::declare_interior_mutable_const)]
const NOT_READY: AtomicBool = AtomicBool::new(false);

/// Fixed-depth log ring, many producers, one drain.
///
/// `N` must be a power of two.
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    entries: UnsafeCell<[LogEntry; N]>,
    /// Set by the producer once its slot is filled, cleared by the drain.
    ready: [AtomicBool; N],
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
    /// Most verbose level still queued.
    threshold: AtomicU8,
}

// SAFETY: a producer writes only the slot its compare-exchange claimed, and
// only after the drain released that slot (cleared `ready`, then advanced
// `read_idx`). The single drain reads a slot only once its `ready` flag is
// set, and the producer never touches it again until it is released.
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

impl<const N: usize> LogStream<N> {
    const MASK: usize = N - 1;

    /// Empty ring queuing `Info` and more severe.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Log buffer size must be power of 2");

        Self {
            entries: UnsafeCell::new([LogEntry::EMPTY; N]),
            ready: [NOT_READY; N],
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            threshold: AtomicU8::new(LogLevel::Info as u8),
        }
    }

    /// Queue `level` and everything more severe.
    pub fn set_threshold(&self, level: LogLevel) {
        self.threshold.store(level as u8, Ordering::Relaxed);
    }

    pub fn threshold(&self) -> LogLevel {
        LogLevel::from_u8(self.threshold.load(Ordering::Relaxed))
    }

    /// Would an entry at `level` be queued?
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level as u8 <= self.threshold.load(Ordering::Relaxed)
    }

    /// Queue one entry without blocking.
    ///
    /// False when filtered by the threshold or when the ring is full; only
    /// the latter counts as dropped.
    #[inline]
    pub fn push(&self, timestamp_us: i64, level: LogLevel, msg: &[u8]) -> bool {
        if !self.enabled(level) {
            return false;
        }

        // read before write so read <= write holds for the pair
        let write = loop {
            let read = self.read_idx.load(Ordering::Acquire);
            let write = self.write_idx.load(Ordering::Acquire);
            if write.wrapping_sub(read) >= N as u32 {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            if self
                .write_idx
                .compare_exchange_weak(write, write.wrapping_add(1), Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                break write;
            }
        };

        let slot = write as usize & Self::MASK;
        let len = msg.len().min(MAX_MSG_LEN);
        // SAFETY: slot `write` belongs to this producer alone until `ready`.
        unsafe {
            let entry = &mut (*self.entries.get())[slot];
            entry.timestamp_us = timestamp_us;
            entry.level = level;
            entry.len = len as u8;
            entry.msg[..len].copy_from_slice(&msg[..len]);
        }
        self.ready[slot].store(true, Ordering::Release);
        true
    }

    /// Oldest queued entry, if any. Single caller only.
    ///
    /// None also while the oldest claimed slot is still being filled.
    #[inline]
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        if read == self.write_idx.load(Ordering::Acquire) {
            return None;
        }

        let slot = read as usize & Self::MASK;
        if !self.ready[slot].load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: single drain, slot filled and marked ready
        let entry = unsafe { (*self.entries.get())[slot] };
        self.ready[slot].store(false, Ordering::Relaxed);
        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Entries lost to a full ring since the last reset.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }

    /// Entries waiting for the drain.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        self.write_idx.load(Ordering::Acquire).wrapping_sub(read)
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Render `args` into `buf`, cutting at its end. Returns bytes written.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    struct Cursor<'a> {
        buf: &'a mut [u8],
        pos: usize,
    }

    impl Write for Cursor<'_> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let n = s.len().min(self.buf.len() - self.pos);
            self.buf[self.pos..self.pos + n].copy_from_slice(&s.as_bytes()[..n]);
            self.pos += n;
            Ok(())
        }
    }

    let mut cursor = Cursor { buf, pos: 0 };
    let _ = core::fmt::write(&mut cursor, args);
    cursor.pos
}

/// `[timestamp_us] LEVEL: message`
pub fn write_entry(entry: &LogEntry, out: &mut dyn Write) -> core::fmt::Result {
    writeln!(
        out,
        "[{:10}] {}: {}",
        entry.timestamp_us,
        entry.level.as_str(),
        entry.message()
    )
}

/// Write out everything queued, then one line for any drops.
///
/// Returns the number of entries written.
pub fn drain_to<const N: usize>(stream: &LogStream<N>, out: &mut dyn Write) -> usize {
    let mut count = 0;
    while let Some(entry) = stream.drain() {
        let _ = write_entry(&entry, out);
        count += 1;
    }

    let dropped = stream.dropped();
    if dropped > 0 {
        let _ = writeln!(out, "[log] {} messages dropped", dropped);
        stream.reset_dropped();
    }
    count
}

/// Format and queue one entry; skipped entirely below the threshold.
///
/// ```ignore
/// rt_log!(LogLevel::Info, LOG_STREAM, now_us, "interval {} us", interval);
/// ```
#[macro_export]
macro_rules! rt_log {
    ($level:expr, $stream:expr, $timestamp:expr, $($arg:tt)*) => {{
        let level = $level;
        if $stream.enabled(level) {
            let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
            let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
            $stream.push($timestamp, level, &buf[..len]);
        }
    }};
}

#[macro_export]
macro_rules! rt_error {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Error, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! rt_warn {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Warn, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! rt_info {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Info, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! rt_debug {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Debug, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! rt_trace {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Trace, $stream, $timestamp, $($arg)*)
    };
}
