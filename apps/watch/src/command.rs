//! Commands typed on stdin while watching

use std::str::FromStr;

use encore_sync::Target;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::WatchError;

/// A line of user input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Seek the remote player, in seconds
    Seek(f64),
    /// Switch to another target
    Watch(Target),
    /// Stop observing without exiting
    Leave,
    Quit,
}

impl FromStr for Command {
    type Err = WatchError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts
            .next()
            .ok_or_else(|| WatchError::InvalidCommand("empty input".to_string()))?;
        let arg = parts.next();

        if parts.next().is_some() {
            return Err(WatchError::InvalidCommand(format!(
                "too many arguments: {}",
                line.trim()
            )));
        }

        match (verb.to_lowercase().as_str(), arg) {
            ("seek", Some(position)) => parse_time(position)
                .map(Command::Seek)
                .ok_or_else(|| WatchError::InvalidCommand(format!("bad position: {}", position))),
            ("watch", Some(target)) => Ok(Command::Watch(target.parse()?)),
            ("leave", None) => Ok(Command::Leave),
            ("quit" | "exit", None) => Ok(Command::Quit),
            _ => Err(WatchError::InvalidCommand(format!(
                "expected `seek <m:ss>`, `watch <target>`, `leave` or `quit`, got `{}`",
                line.trim()
            ))),
        }
    }
}

/// Parse `90`, `1:30` or `1:02:03` into seconds
pub fn parse_time(input: &str) -> Option<f64> {
    let mut total = 0.0;
    let mut fields = 0;
    for field in input.split(':') {
        fields += 1;
        let value: f64 = field.parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        // Minutes and seconds after the leading field must stay below 60
        if fields > 1 && value >= 60.0 {
            return None;
        }
        total = total * 60.0 + value;
    }
    (fields <= 3).then_some(total)
}

/// Read commands from stdin until it closes
///
/// Unparseable lines are logged and skipped.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<Command> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Ignoring input"),
            }
        }
    });
    rx
}
