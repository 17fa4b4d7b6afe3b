//! `retryable retry` – tell a running fetch to re-issue its pending calls.

use anyhow::{Context, Result};
use retryable_core::control::{default_control_socket_path, ControlCommand};

use crate::cli::control_socket;

pub async fn run_retry() -> Result<()> {
    let path = default_control_socket_path()?;
    control_socket::send_command(&path, ControlCommand::Retry)
        .await
        .with_context(|| format!("no running fetch at {}", path.display()))?;
    println!("Requested retry of pending calls");
    Ok(())
}
