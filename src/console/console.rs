//! Main console struct

use core::fmt::Write;

use super::{execute, parse_line, ConsoleError, LineBuffer};
use crate::synth::SynthControl;

/// Version string (set by build.rs, includes git hash)
pub const VERSION: &str = env!("VERSION_STRING");

/// Console state machine
///
/// Fed one byte at a time. With `echo` off (the default, for the host
/// driver) nothing but command replies is written.
pub struct Console {
    line: LineBuffer,
    echo: bool,
    /// Last byte was CR, swallow a following LF
    after_cr: bool,
}

impl Console {
    /// Create new console, echo off
    pub const fn new() -> Self {
        Self {
            line: LineBuffer::new(),
            echo: false,
            after_cr: false,
        }
    }

    /// Interactive mode: echo typed characters and print a prompt
    pub const fn with_echo(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Process a single input byte
    ///
    /// Returns Some(result) if a command ran, None if more input needed.
    /// Errors are already printed to `out` as `Exx: message`.
    pub fn process_byte(
        &mut self,
        byte: u8,
        synth: &mut dyn SynthControl,
        out: &mut dyn Write,
    ) -> Option<Result<(), ConsoleError>> {
        let after_cr = core::mem::replace(&mut self.after_cr, byte == b'\r');

        match byte {
            // CRLF counts once
            b'\n' if after_cr => None,

            // Enter
            b'\r' | b'\n' => {
                if self.echo {
                    let _ = writeln!(out);
                }

                let result = if self.line.as_str().trim().is_empty() {
                    None
                } else {
                    let cmd = parse_line(self.line.as_str());
                    let result = execute(&cmd, synth, out);
                    if let Err(e) = result {
                        let _ = writeln!(out, "{}", e);
                    }
                    Some(result)
                };

                self.line.clear();
                self.print_prompt(out);
                result
            }

            // Backspace
            0x7F | 0x08 => {
                if self.line.backspace() && self.echo {
                    // Echo: backspace, space, backspace
                    let _ = write!(out, "\x08 \x08");
                }
                None
            }

            // Ctrl+C
            0x03 => {
                if self.echo {
                    let _ = writeln!(out, "^C");
                }
                self.line.clear();
                self.print_prompt(out);
                None
            }

            // Printable character
            0x20..=0x7E => {
                if self.line.push(byte) && self.echo {
                    let _ = write!(out, "{}", byte as char);
                }
                None
            }

            _ => None,
        }
    }

    /// Print the prompt (echo mode only)
    pub fn print_prompt(&self, out: &mut dyn Write) {
        if self.echo {
            let _ = write!(out, "{}> ", VERSION);
        }
    }

    /// Print welcome banner
    pub fn print_banner(&self, out: &mut dyn Write) {
        let _ = writeln!(out, "\r\n{}", VERSION);
        let _ = writeln!(out, "Type 'help' for commands.\r");
        self.print_prompt(out);
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
