//! Command handlers
//!
//! Every handler drives the engine through [`SynthControl`] and answers
//! with `key=value` lines.

use core::fmt::Write;

use super::parser::ParsedCommand;
use super::ConsoleError;
use crate::config::CONFIG;
use crate::log_globals::LOG_STREAM;
use crate::logging::LogLevel;
use crate::synth::{EngineState, PlaybackMode, SynthControl};

/// Handler signature shared by all commands
pub type Handler =
    fn(&ParsedCommand<'_>, &mut dyn SynthControl, &mut dyn Write) -> Result<(), ConsoleError>;

/// Command descriptor
pub struct CommandDescriptor {
    pub name: &'static str,
    pub brief: &'static str,
    pub handler: Handler,
}

/// Upper bound for `SYNTH.STEP n`
pub const MAX_STEPS: u32 = 65_535;

/// All available commands
pub static COMMANDS: &[CommandDescriptor] = &[
    CommandDescriptor { name: "help", brief: "List commands", handler: cmd_help },
    CommandDescriptor { name: "SYNTH.FREQ", brief: "Set frequency (Hz) and restart", handler: cmd_freq },
    CommandDescriptor { name: "SYNTH.AMP", brief: "Set amplitude (V), next start", handler: cmd_amp },
    CommandDescriptor { name: "SYNTH.SAMPLES", brief: "Set samples per period, next start", handler: cmd_samples },
    CommandDescriptor { name: "SYNTH.START", brief: "Start continuous playback", handler: cmd_start },
    CommandDescriptor { name: "SYNTH.STOP", brief: "Stop playback", handler: cmd_stop },
    CommandDescriptor { name: "SYNTH.STEP", brief: "Emit n samples manually", handler: cmd_step },
    CommandDescriptor { name: "SYNTH.STATUS", brief: "Show parameters and state", handler: cmd_status },
    CommandDescriptor { name: "stats", brief: "Playback statistics", handler: cmd_stats },
    CommandDescriptor { name: "save", brief: "Persist parameters to NVS", handler: cmd_save },
    CommandDescriptor { name: "log", brief: "Show/set log level", handler: cmd_log },
];

/// Execute a parsed command
pub fn execute(
    cmd: &ParsedCommand<'_>,
    synth: &mut dyn SynthControl,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    if cmd.command.is_empty() {
        return Ok(()); // Empty line, do nothing
    }

    let handler = find(cmd.command).ok_or(ConsoleError::UnknownCommand)?;
    (handler.handler)(cmd, synth, out)
}

/// Get all command names
pub fn command_names() -> impl Iterator<Item = &'static str> {
    COMMANDS.iter().map(|c| c.name)
}

fn find(name: &str) -> Option<&'static CommandDescriptor> {
    COMMANDS.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

fn parse_arg<T: core::str::FromStr>(cmd: &ParsedCommand<'_>, idx: usize) -> Result<T, ConsoleError> {
    cmd.arg(idx)
        .ok_or(ConsoleError::MissingArg)?
        .parse()
        .map_err(|_| ConsoleError::InvalidValue)
}

fn state_name(state: EngineState) -> &'static str {
    match state {
        EngineState::Idle => "idle",
        EngineState::Running(PlaybackMode::Manual) => "manual",
        EngineState::Running(PlaybackMode::Continuous) => "continuous",
    }
}

// --- Command Implementations ---

fn cmd_help(
    cmd: &ParsedCommand<'_>,
    _synth: &mut dyn SynthControl,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    if let Some(name) = cmd.arg(0) {
        let c = find(name).ok_or(ConsoleError::UnknownCommand)?;
        let _ = writeln!(out, "{}: {}", c.name, c.brief);
    } else {
        for c in COMMANDS {
            let _ = writeln!(out, "  {:<14} {}", c.name, c.brief);
        }
    }
    Ok(())
}

fn cmd_freq(
    cmd: &ParsedCommand<'_>,
    synth: &mut dyn SynthControl,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let hz: f32 = parse_arg(cmd, 0)?;
    synth.set_frequency(hz)?;
    synth.start_continuous()?;
    let _ = writeln!(out, "freq={}", hz);
    let _ = writeln!(out, "interval={}", synth.interval());
    Ok(())
}

fn cmd_amp(
    cmd: &ParsedCommand<'_>,
    synth: &mut dyn SynthControl,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let volts: f32 = parse_arg(cmd, 0)?;
    synth.set_amplitude(volts)?;
    let _ = writeln!(out, "amp={}", volts);
    Ok(())
}

fn cmd_samples(
    cmd: &ParsedCommand<'_>,
    synth: &mut dyn SynthControl,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let n: usize = parse_arg(cmd, 0)?;
    synth.set_sample_count(n)?;
    let _ = writeln!(out, "samples={}", n);
    Ok(())
}

fn cmd_start(
    _cmd: &ParsedCommand<'_>,
    synth: &mut dyn SynthControl,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    synth.start_continuous()?;
    let _ = writeln!(out, "interval={}", synth.interval());
    Ok(())
}

fn cmd_stop(
    _cmd: &ParsedCommand<'_>,
    synth: &mut dyn SynthControl,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    synth.stop();
    let _ = writeln!(out, "state={}", state_name(synth.state()));
    Ok(())
}

fn cmd_step(
    cmd: &ParsedCommand<'_>,
    synth: &mut dyn SynthControl,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let steps: u32 = match cmd.arg(0) {
        Some(s) => s.parse().map_err(|_| ConsoleError::InvalidValue)?,
        None => 1,
    };
    if steps > MAX_STEPS {
        return Err(ConsoleError::OutOfRange);
    }

    if !synth.is_running() {
        synth.start()?;
    }
    for _ in 0..steps {
        synth.update();
    }

    let stats = synth.stats();
    let _ = writeln!(out, "ticks={}", stats.ticks);
    let _ = writeln!(out, "level={}", stats.last_level);
    Ok(())
}

fn cmd_status(
    _cmd: &ParsedCommand<'_>,
    synth: &mut dyn SynthControl,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let params = synth.params();
    let _ = writeln!(out, "freq={}", params.frequency());
    let _ = writeln!(out, "amp={}", params.amplitude());
    let _ = writeln!(out, "samples={}", params.sample_count());
    let _ = writeln!(out, "interval={}", synth.interval());
    let _ = writeln!(out, "state={}", state_name(synth.state()));
    Ok(())
}

fn cmd_stats(
    _cmd: &ParsedCommand<'_>,
    synth: &mut dyn SynthControl,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let stats = synth.stats();
    let _ = writeln!(out, "ticks={}", stats.ticks);
    let _ = writeln!(out, "publishes={}", stats.publishes);
    let _ = writeln!(out, "cursor_races={}", stats.cursor_races);
    let _ = writeln!(out, "clamped={}", stats.clamped);
    let _ = writeln!(out, "last_level={}", stats.last_level);
    Ok(())
}

fn cmd_save(
    _cmd: &ParsedCommand<'_>,
    synth: &mut dyn SynthControl,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    CONFIG.store(&synth.params());
    CONFIG.request_save();
    let _ = writeln!(out, "save=pending");
    Ok(())
}

fn cmd_log(
    cmd: &ParsedCommand<'_>,
    _synth: &mut dyn SynthControl,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    if let Some(name) = cmd.arg(0) {
        let level = LogLevel::parse(name).ok_or(ConsoleError::InvalidValue)?;
        LOG_STREAM.set_threshold(level);
    }
    let _ = writeln!(out, "log={}", LOG_STREAM.threshold().as_str());
    Ok(())
}
