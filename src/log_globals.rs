//! Global log stream instance.

use crate::logging::LogStream;

/// Foreground log stream.
///
/// Engine state changes and rejected starts land here; the firmware loop
/// drains it to the serial console.
pub static LOG_STREAM: LogStream = LogStream::new();
