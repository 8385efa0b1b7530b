//! Byte-level console tests

mod common;

use common::{engine, TestEngine, TestOutput};
use dac_synth::console::{Console, ConsoleError};

fn feed(
    console: &mut Console,
    engine: &mut TestEngine,
    out: &mut TestOutput,
    input: &[u8],
) -> Vec<Result<(), ConsoleError>> {
    input
        .iter()
        .filter_map(|&b| console.process_byte(b, &mut *engine, &mut *out))
        .collect()
}

#[test]
fn test_line_terminated_by_crlf_runs_once() {
    let mut engine: TestEngine = engine();
    let mut console = Console::new();
    let mut out = TestOutput::new();

    let results = feed(&mut console, &mut engine, &mut out, b"SYNTH.SAMPLES 16\r\n");
    assert_eq!(results, vec![Ok(())]);
    assert_eq!(out.text, "samples=16\n");
    assert_eq!(engine.params().sample_count(), 16);
}

#[test]
fn test_lf_only_and_cr_only() {
    let mut engine: TestEngine = engine();
    let mut console = Console::new();
    let mut out = TestOutput::new();

    let results = feed(&mut console, &mut engine, &mut out, b"SYNTH.AMP 1\nSYNTH.AMP 2\r");
    assert_eq!(results.len(), 2);
    assert_eq!(engine.params().amplitude(), 2.0);
}

#[test]
fn test_backspace_edits_line() {
    let mut engine: TestEngine = engine();
    let mut console = Console::new();
    let mut out = TestOutput::new();

    feed(&mut console, &mut engine, &mut out, b"SYNTH.SAMPLES 166\x08\n");
    assert_eq!(engine.params().sample_count(), 16);
}

#[test]
fn test_errors_are_printed_with_code() {
    let mut engine: TestEngine = engine();
    let mut console = Console::new();
    let mut out = TestOutput::new();

    let results = feed(&mut console, &mut engine, &mut out, b"bogus\nSYNTH.FREQ 0\n");
    assert_eq!(results.len(), 2);
    assert!(out.contains("E01: unknown command"));
    assert!(out.contains("E11: frequency must be > 0"));
}

#[test]
fn test_empty_lines_and_ctrl_c_run_nothing() {
    let mut engine: TestEngine = engine();
    let mut console = Console::new();
    let mut out = TestOutput::new();

    let results = feed(&mut console, &mut engine, &mut out, b"\n\n  \nSYNTH.STOP\x03\n");
    assert!(results.is_empty());
    assert!(out.text.is_empty());
}

#[test]
fn test_echo_mode_prints_prompt() {
    let mut engine: TestEngine = engine();
    let mut console = Console::new().with_echo();
    let mut out = TestOutput::new();

    feed(&mut console, &mut engine, &mut out, b"help\r");
    assert!(out.contains("help"));
    assert!(out.contains("DacSynth"));
    assert!(out.text.ends_with("> "));
}
