//! Transport dispatcher: ships an encoded frame to the receiving host

use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::process::Command;

use super::error::DeliveryError;
use crate::app::SenderConfig;

/// How a frame reaches the receiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport<'a> {
    /// Plain TCP connection, typically to an SSH port forward
    Socket { host: &'a str, port: u16 },
    /// Shell command fed the frame on stdin
    Command(&'a str),
}

impl<'a> Transport<'a> {
    /// A configured command takes precedence over the socket
    pub fn from_config(config: &'a SenderConfig) -> Self {
        match config.command() {
            Some(command) => Transport::Command(command),
            None => Transport::Socket {
                host: &config.host,
                port: config.port,
            },
        }
    }
}

/// Deliver one frame, exactly once
///
/// Failures come back as values; nothing is retried.
pub async fn send(payload: &[u8], config: &SenderConfig) -> Result<(), DeliveryError> {
    match Transport::from_config(config) {
        Transport::Socket { host, port } => {
            send_socket(payload, host, port, config.connect_timeout()).await
        }
        Transport::Command(command) => {
            send_command(payload, command, config.command_timeout()).await
        }
    }
}

async fn send_socket(
    payload: &[u8],
    host: &str,
    port: u16,
    timeout: Duration,
) -> Result<(), DeliveryError> {
    let addr = format!("{}:{}", host, port);

    let mut stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
        .await
        .map_err(|_| DeliveryError::Timeout(timeout.as_millis() as u64))?
        .map_err(|source| DeliveryError::Connect {
            addr: addr.clone(),
            source,
        })?;

    tokio::time::timeout(timeout, async {
        stream.write_all(payload).await?;
        stream.shutdown().await
    })
    .await
    .map_err(|_| DeliveryError::Timeout(timeout.as_millis() as u64))??;

    tracing::debug!("Sent {} bytes to {}", payload.len(), addr);
    Ok(())
}

async fn send_command(
    payload: &[u8],
    command: &str,
    timeout: Duration,
) -> Result<(), DeliveryError> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| DeliveryError::Spawn {
            command: command.to_string(),
            source,
        })?;

    let run = async move {
        if let Some(mut stdin) = child.stdin.take() {
            // A command that ignores its input may close the pipe early
            if let Err(e) = stdin.write_all(payload).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(DeliveryError::Io(e));
                }
            }
        }
        child.wait_with_output().await.map_err(DeliveryError::Io)
    };

    // Dropping the child on timeout kills it
    let output = tokio::time::timeout(timeout, run)
        .await
        .map_err(|_| DeliveryError::Timeout(timeout.as_millis() as u64))??;

    if !output.status.success() {
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        return Err(DeliveryError::CommandFailed {
            command: command.to_string(),
            status: output.status,
            output: combined.trim().to_string(),
        });
    }

    tracing::debug!("Delivered {} bytes via `{}`", payload.len(), command);
    Ok(())
}
