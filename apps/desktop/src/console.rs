//! Line-oriented input for the interactive console.

use anyhow::{anyhow, bail, Context};
use client_core::command_for_key;
use shared::{
    domain::{TouchPhase, Zone},
    protocol::Command,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleInput {
    Command(Command),
    Touch {
        zone: Zone,
        phase: TouchPhase,
        x: f64,
        y: f64,
    },
    Release,
    Quit,
}

/// Parses one console line. Blank lines and `#` comments yield `None`.
///
/// Key names take precedence over command names, so `s` is standby rather
/// than an unknown token.
pub fn parse_line(line: &str) -> anyhow::Result<Option<ConsoleInput>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let head = words.next().unwrap_or_default();
    let input = match head.to_ascii_lowercase().as_str() {
        "quit" | "exit" => ConsoleInput::Quit,
        "release" => ConsoleInput::Release,
        "touch" => {
            let args: Vec<&str> = words.collect();
            let [zone, phase, x, y] = args.as_slice() else {
                bail!("usage: touch <primary|secondary> <down|move|up> <x> <y>");
            };
            ConsoleInput::Touch {
                zone: zone.parse().map_err(|err: String| anyhow!(err))?,
                phase: phase.parse().map_err(|err: String| anyhow!(err))?,
                x: x.parse().with_context(|| format!("invalid x coordinate '{x}'"))?,
                y: y.parse().with_context(|| format!("invalid y coordinate '{y}'"))?,
            }
        }
        _ => {
            if words.next().is_some() {
                bail!("expected a single key or command, got '{line}'");
            }
            let command = match command_for_key(head) {
                Some(command) => command,
                None => head.parse::<Command>()?,
            };
            ConsoleInput::Command(command)
        }
    };
    Ok(Some(input))
}

#[cfg(test)]
#[path = "tests/console_tests.rs"]
mod tests;
