//! Control commands for a running fetch: bulk retry or clear pending calls.
//!
//! A running `retryable fetch` listens on a Unix socket; each line is one
//! command (`retry` or `clear`). The connectivity side of the system (a
//! user, a script, a network hook) drives bulk retries through it.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;

use crate::retry::RetryRegistry;

/// One line of the control protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Re-issue every pending call now.
    Retry,
    /// Forget every pending call.
    Clear,
}

/// Error for an unrecognised control line.
#[derive(Debug, thiserror::Error)]
#[error("unknown control command: {0:?}")]
pub struct UnknownCommand(pub String);

impl FromStr for ControlCommand {
    type Err = UnknownCommand;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        match line.trim().to_ascii_lowercase().as_str() {
            "retry" => Ok(ControlCommand::Retry),
            "clear" => Ok(ControlCommand::Clear),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlCommand::Retry => write!(f, "retry"),
            ControlCommand::Clear => write!(f, "clear"),
        }
    }
}

impl ControlCommand {
    /// Apply to `registry`; returns the number of calls re-issued (0 for `Clear`).
    pub fn apply(self, registry: &RetryRegistry) -> usize {
        match self {
            ControlCommand::Retry => registry.retry_all(),
            ControlCommand::Clear => {
                registry.clear();
                0
            }
        }
    }
}

/// Default path for the control socket (same XDG state dir as the log).
pub fn default_control_socket_path() -> Result<PathBuf> {
    Ok(crate::config::state_dir()?.join("control.sock"))
}
