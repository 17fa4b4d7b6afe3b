//! Control socket: server (during `retryable fetch`) and client (`retry`, `clear`).
//! Protocol: one command per line, see [`ControlCommand`].

use anyhow::Result;
use retryable_core::control::ControlCommand;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

/// Binds `path` and spawns a task forwarding each parsed command to `commands`.
/// Unknown lines are logged and ignored.
pub fn spawn_control_listener(
    path: impl AsRef<Path>,
    commands: mpsc::UnboundedSender<ControlCommand>,
) -> Result<tokio::task::JoinHandle<()>> {
    let path = path.as_ref().to_path_buf();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = std::fs::remove_file(&path);
    let listener = UnixListener::bind(&path)?;
    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let commands = commands.clone();
                    tokio::spawn(async move {
                        let mut reader = BufReader::new(stream).lines();
                        while let Ok(Some(line)) = reader.next_line().await {
                            if line.trim().is_empty() {
                                continue;
                            }
                            match line.parse::<ControlCommand>() {
                                Ok(cmd) => {
                                    tracing::debug!(%cmd, "control command received");
                                    let _ = commands.send(cmd);
                                }
                                Err(e) => tracing::warn!("control socket: {}", e),
                            }
                        }
                    });
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    });
    Ok(handle)
}

/// Sends one command line to the control socket at `socket_path`.
pub async fn send_command(socket_path: &Path, cmd: ControlCommand) -> Result<()> {
    let mut stream = UnixStream::connect(socket_path).await?;
    stream.write_all(format!("{}\n", cmd).as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}
