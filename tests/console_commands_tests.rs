//! Command handler tests

mod common;

use common::{engine, engine_with_timer, MockTimer, TestEngine, TestOutput};
use dac_synth::console::commands::{execute, COMMANDS, MAX_STEPS};
use dac_synth::console::parser::parse_line;
use dac_synth::console::ConsoleError;
use dac_synth::logging::LogLevel;
use dac_synth::config::MIN_TICK_INTERVAL_US;
use dac_synth::{EngineState, PeriodicTimer, PlaybackMode, SynthError, CONFIG, LOG_STREAM};

fn run(engine: &mut TestEngine, line: &str) -> (Result<(), ConsoleError>, TestOutput) {
    let mut out = TestOutput::new();
    let result = execute(&parse_line(line), engine, &mut out);
    (result, out)
}

#[test]
fn test_command_registry_has_all_commands() {
    let expected = [
        "help",
        "SYNTH.FREQ",
        "SYNTH.AMP",
        "SYNTH.SAMPLES",
        "SYNTH.START",
        "SYNTH.STOP",
        "SYNTH.STEP",
        "SYNTH.STATUS",
        "stats",
        "save",
        "log",
    ];

    for name in expected {
        assert!(
            COMMANDS.iter().any(|c| c.name == name),
            "Command '{}' should be in registry",
            name
        );
    }
}

#[test]
fn test_execute_unknown_command() {
    let mut engine: TestEngine = engine();
    let (result, _) = run(&mut engine, "foobar");
    assert_eq!(result, Err(ConsoleError::UnknownCommand));
}

#[test]
fn test_execute_empty_line() {
    let mut engine: TestEngine = engine();
    let (result, out) = run(&mut engine, "   ");
    assert!(result.is_ok());
    assert!(out.text.is_empty());
}

#[test]
fn test_execute_help() {
    let mut engine: TestEngine = engine();
    let (result, out) = run(&mut engine, "help");
    assert!(result.is_ok());
    assert!(out.contains("SYNTH.FREQ"));

    let (result, out) = run(&mut engine, "help synth.step");
    assert!(result.is_ok());
    assert!(out.contains("SYNTH.STEP:"));
}

#[test]
fn test_freq_restarts_continuous() {
    let mut engine: TestEngine = engine();
    let (result, out) = run(&mut engine, "SYNTH.FREQ 500");

    assert!(result.is_ok());
    assert!(out.contains("freq=500"));
    assert!(out.contains("interval=125"));
    assert_eq!(engine.state(), EngineState::Running(PlaybackMode::Continuous));
    assert_eq!(engine.timer().interval_us(), 125.0);
}

#[test]
fn test_default_freq_plays_on_slowest_timer() {
    let mut engine: TestEngine =
        engine_with_timer(MockTimer::new().with_min_interval(MIN_TICK_INTERVAL_US));
    let (result, out) = run(&mut engine, "SYNTH.FREQ 1000");

    assert!(result.is_ok());
    assert!(out.contains("interval=62.5"));
    assert_eq!(engine.state(), EngineState::Running(PlaybackMode::Continuous));
}

#[test]
fn test_freq_outside_timer_range_reports_code() {
    let mut engine: TestEngine =
        engine_with_timer(MockTimer::new().with_min_interval(MIN_TICK_INTERVAL_US));

    run(&mut engine, "SYNTH.SAMPLES 64").0.unwrap();
    let (result, _) = run(&mut engine, "SYNTH.FREQ 1000");
    assert_eq!(result, Err(ConsoleError::Rejected(SynthError::IntervalTooShort)));

    let (result, _) = run(&mut engine, "SYNTH.FREQ 0.01");
    assert_eq!(result.unwrap_err().code(), "E15");
    assert!(!engine.timer().is_armed());
}

#[test]
fn test_command_names_are_case_insensitive() {
    let mut engine: TestEngine = engine();
    let (result, out) = run(&mut engine, "synth.freq 250");
    assert!(result.is_ok());
    assert_eq!(engine.params().frequency(), 250.0);
    assert!(out.contains("freq=250"));
}

#[test]
fn test_freq_argument_errors() {
    let mut engine: TestEngine = engine();

    assert_eq!(run(&mut engine, "SYNTH.FREQ").0, Err(ConsoleError::MissingArg));
    assert_eq!(run(&mut engine, "SYNTH.FREQ abc").0, Err(ConsoleError::InvalidValue));

    let (result, _) = run(&mut engine, "SYNTH.FREQ -5");
    assert_eq!(result, Err(ConsoleError::Rejected(SynthError::InvalidFrequency)));
    assert_eq!(result.unwrap_err().code(), "E11");
    assert_eq!(engine.params().frequency(), 1000.0);
    assert_eq!(engine.state(), EngineState::Idle);
}

#[test]
fn test_amp_validated_and_deferred() {
    let mut engine: TestEngine = engine();

    let (result, out) = run(&mut engine, "SYNTH.AMP 1.5");
    assert!(result.is_ok());
    assert!(out.contains("amp=1.5"));
    assert_eq!(engine.params().amplitude(), 1.5);
    assert!(!engine.is_running());

    let (result, _) = run(&mut engine, "SYNTH.AMP 4");
    assert_eq!(result, Err(ConsoleError::Rejected(SynthError::InvalidAmplitude)));
    assert_eq!(engine.params().amplitude(), 1.5);
}

#[test]
fn test_samples_checked_against_capacity() {
    let mut engine: TestEngine = engine();

    assert!(run(&mut engine, "SYNTH.SAMPLES 128").0.is_ok());
    assert_eq!(engine.params().sample_count(), 128);

    let (result, _) = run(&mut engine, "SYNTH.SAMPLES 5000");
    assert_eq!(result, Err(ConsoleError::Rejected(SynthError::SampleCountOutOfRange)));
    assert_eq!(run(&mut engine, "SYNTH.SAMPLES 1.5").0, Err(ConsoleError::InvalidValue));
}

#[test]
fn test_start_and_stop() {
    let mut engine: TestEngine = engine();

    let (result, out) = run(&mut engine, "SYNTH.START");
    assert!(result.is_ok());
    assert!(out.contains("interval=62.5"));
    assert!(engine.timer().is_armed());

    let (result, out) = run(&mut engine, "SYNTH.STOP");
    assert!(result.is_ok());
    assert!(out.contains("state=idle"));
    assert!(!engine.timer().is_armed());
    assert_eq!(engine.output().last(), Some(0));
}

#[test]
fn test_step_starts_manual_playback() {
    let mut engine: TestEngine = engine();
    run(&mut engine, "SYNTH.SAMPLES 4").0.unwrap();

    let (result, out) = run(&mut engine, "SYNTH.STEP");
    assert!(result.is_ok());
    assert_eq!(engine.state(), EngineState::Running(PlaybackMode::Manual));
    assert!(out.contains("ticks=1"));
    assert!(out.contains("level=4095"));

    let (_, out) = run(&mut engine, "SYNTH.STEP 3");
    assert!(out.contains("ticks=4"));
    assert_eq!(engine.output().levels(), vec![4095, 2048, 0, 2048]);
}

#[test]
fn test_step_count_limits() {
    let mut engine: TestEngine = engine();
    let line = format!("SYNTH.STEP {}", MAX_STEPS + 1);
    assert_eq!(run(&mut engine, &line).0, Err(ConsoleError::OutOfRange));
    assert_eq!(run(&mut engine, "SYNTH.STEP -1").0, Err(ConsoleError::InvalidValue));
    assert!(!engine.is_running());
}

#[test]
fn test_status_reports_parameters() {
    let mut engine: TestEngine = engine();
    let (result, out) = run(&mut engine, "SYNTH.STATUS");

    assert!(result.is_ok());
    assert_eq!(
        out.lines(),
        vec!["freq=1000", "amp=3.3", "samples=16", "interval=0", "state=idle"]
    );
}

#[test]
fn test_stats_reports_counters() {
    let mut engine: TestEngine = engine();
    run(&mut engine, "SYNTH.STEP 2").0.unwrap();

    let (result, out) = run(&mut engine, "stats");
    assert!(result.is_ok());
    assert!(out.contains("ticks=2"));
    assert!(out.contains("publishes=1"));
    assert!(out.contains("cursor_races=0"));
}

#[test]
fn test_save_stores_and_requests() {
    let mut engine: TestEngine = engine();
    run(&mut engine, "SYNTH.AMP 2.5").0.unwrap();
    let _ = CONFIG.take_save_request();

    let (result, out) = run(&mut engine, "save");
    assert!(result.is_ok());
    assert!(out.contains("save=pending"));
    assert!(CONFIG.take_save_request());
    assert_eq!(CONFIG.amplitude(), 2.5);
}

#[test]
fn test_log_level_control() {
    let mut engine: TestEngine = engine();

    let (result, out) = run(&mut engine, "log debug");
    assert!(result.is_ok());
    assert!(out.contains("log=DEBUG"));
    assert_eq!(LOG_STREAM.threshold(), LogLevel::Debug);

    assert_eq!(run(&mut engine, "log verbose").0, Err(ConsoleError::InvalidValue));
    let (_, out) = run(&mut engine, "log");
    assert!(out.contains("log=DEBUG"));
}
