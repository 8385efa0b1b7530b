//! DacSynth - Main entry point
//!
//! 1. Load persisted settings into CONFIG
//! 2. Bring up the analog output and the periodic source
//! 3. Start continuous playback with the loaded settings
//! 4. Serve the serial console, drain logs, persist on request

use std::io::{Read, Write as _};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use dac_synth::console::Console;
use dac_synth::logging::drain_to;
use dac_synth::{SynthControl, LOG_STREAM};

#[cfg(target_os = "espidf")]
mod firmware;
#[cfg(not(target_os = "espidf"))]
mod host_sim;

/// Console poll period
const POLL_INTERVAL: Duration = Duration::from_millis(10);

fn main() {
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        if let Err(e) = firmware::run() {
            eprintln!("fatal: {}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    host_sim::run();
}

/// `core::fmt::Write` over stdout
struct StdoutWriter;

impl std::fmt::Write for StdoutWriter {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        print!("{}", s);
        Ok(())
    }
}

/// Stdin bytes, read on a helper thread so the loop never blocks.
fn spawn_stdin_reader() -> Receiver<u8> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut byte = [0u8; 1];
        let mut stdin = std::io::stdin();
        while let Ok(1) = stdin.read(&mut byte) {
            if tx.send(byte[0]).is_err() {
                break;
            }
        }
    });
    rx
}

/// Foreground loop shared by firmware and host builds.
///
/// `on_save` runs whenever the console asked for persistence.
fn serve_console(synth: &mut dyn SynthControl, mut on_save: impl FnMut(&mut dyn std::fmt::Write)) -> ! {
    let input = spawn_stdin_reader();
    let mut console = Console::new().with_echo();
    let mut out = StdoutWriter;
    console.print_banner(&mut out);

    loop {
        while let Ok(byte) = input.try_recv() {
            console.process_byte(byte, synth, &mut out);
        }

        if dac_synth::CONFIG.take_save_request() {
            on_save(&mut out);
        }

        if drain_to(&LOG_STREAM, &mut out) > 0 {
            console.print_prompt(&mut out);
        }

        let _ = std::io::stdout().flush();
        thread::sleep(POLL_INTERVAL);
    }
}
