//! Receiver: accepts frames over TCP or stdin and shows them locally

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpListener;

use super::notifier::Notifier;
use super::protocol::decode;
use crate::app::ReceiverConfig;

/// Bind the configured address and serve until the process is stopped
pub async fn run_listener<N: Notifier>(config: &ReceiverConfig, notifier: N) -> Result<()> {
    let addr = SocketAddr::new(config.bind_address, config.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Notification listener started at: {}", addr);

    serve(listener, config, notifier).await
}

/// Accept connections one at a time, handling each fully before the next
pub async fn serve<N: Notifier>(
    listener: TcpListener,
    config: &ReceiverConfig,
    notifier: N,
) -> Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tracing::debug!("Connection from {}", peer);
                handle_payload(stream, Some(config.read_timeout()), config, &notifier).await;
            }
            Err(e) => {
                tracing::warn!("Failed to accept connection: {}", e);
            }
        }
    }
}

/// Read one frame from stdin, show it, and return
pub async fn run_stdin<N: Notifier>(config: &ReceiverConfig, notifier: &N) {
    handle_single(tokio::io::stdin(), config, notifier).await;
}

/// Read `reader` to EOF as a single frame; pauses in the stream are waited out
pub async fn handle_single<R, N>(reader: R, config: &ReceiverConfig, notifier: &N)
where
    R: AsyncRead + Unpin,
    N: Notifier + ?Sized,
{
    handle_payload(reader, None, config, notifier).await;
}

/// Drain `reader`, decode it and hand it to the notifier; never fails
///
/// With an `idle` timeout, a reader that stays quiet that long is treated as
/// finished.
pub async fn handle_payload<R, N>(
    reader: R,
    idle: Option<Duration>,
    config: &ReceiverConfig,
    notifier: &N,
) where
    R: AsyncRead + Unpin,
    N: Notifier + ?Sized,
{
    let payload = match drain(reader, idle, config.max_payload_bytes).await {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("Error reading payload: {:#}", e);
            return;
        }
    };

    if payload.is_empty() {
        tracing::debug!("Ignoring empty payload");
        return;
    }

    match decode(&payload) {
        Ok(event) => notifier.notify(&event),
        Err(e) => tracing::warn!("Discarding malformed payload: {}", e),
    }
}

/// Read until EOF, or until the peer goes quiet for `idle`
async fn drain<R: AsyncRead + Unpin>(
    mut reader: R,
    idle: Option<Duration>,
    max_payload_bytes: usize,
) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    let mut buf = [0u8; 1024];

    loop {
        let read = match idle {
            Some(idle) => match tokio::time::timeout(idle, reader.read(&mut buf)).await {
                Ok(read) => read,
                Err(_) => {
                    tracing::debug!("Peer idle, treating {} bytes as complete", payload.len());
                    break;
                }
            },
            None => reader.read(&mut buf).await,
        };
        let n = read.context("Failed to read payload")?;
        if n == 0 {
            break;
        }
        if payload.len() + n > max_payload_bytes {
            anyhow::bail!("Payload too large: more than {} bytes", max_payload_bytes);
        }
        payload.extend_from_slice(&buf[..n]);
    }

    Ok(payload)
}
