//! `retryable clear` – tell a running fetch to drop its pending calls.

use anyhow::{Context, Result};
use retryable_core::control::{default_control_socket_path, ControlCommand};

use crate::cli::control_socket;

pub async fn run_clear() -> Result<()> {
    let path = default_control_socket_path()?;
    control_socket::send_command(&path, ControlCommand::Clear)
        .await
        .with_context(|| format!("no running fetch at {}", path.display()))?;
    println!("Cleared pending calls");
    Ok(())
}
