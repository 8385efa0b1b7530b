//! Serial console for the synthesizer
//!
//! Line protocol spoken by the host driver (`SYNTH.FREQ 1000\n`, ...).
//! Polled one byte at a time from the firmware loop.
//! Zero heap allocation - all static buffers.

pub mod commands;
pub mod console;
pub mod error;
pub mod line_buffer;
pub mod parser;

pub use commands::{command_names, execute, COMMANDS};
pub use console::Console;
pub use error::ConsoleError;
pub use line_buffer::LineBuffer;
pub use parser::{parse_line, ParsedCommand};
