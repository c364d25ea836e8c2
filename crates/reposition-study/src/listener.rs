//! UDP log listener: every received datagram becomes one newline-terminated
//! line in the append-only log file. No framing, no acknowledgment; lost
//! datagrams are simply absent from the log.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::net::UdpSocket;
use tracing::{debug, info};

/// Largest accepted datagram.
pub const MAX_DATAGRAM: usize = 4096;

#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub port: u16,
    pub log_path: PathBuf,
}

/// Decode a datagram as strict UTF-8 text. Malformed input is fatal.
pub fn decode_datagram(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).context("datagram is not valid UTF-8")
}

/// Append one newline-terminated log line and flush immediately.
pub async fn append_line(log_file: &mut File, line: &str) -> Result<()> {
    log_file.write_all(line.as_bytes()).await?;
    log_file.write_all(b"\n").await?;
    log_file.flush().await?;
    Ok(())
}

/// Bind the socket and collect datagrams until interrupted.
pub async fn run(config: ListenerConfig) -> Result<()> {
    let socket = UdpSocket::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("binding UDP port {}", config.port))?;
    let mut log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
        .await
        .with_context(|| format!("opening log file {}", config.log_path.display()))?;

    info!(
        port = config.port,
        log = %config.log_path.display(),
        "listening for telemetry"
    );

    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        let (len, peer) = socket.recv_from(&mut buf).await?;
        let line = decode_datagram(&buf[..len])?;
        debug!(%peer, bytes = len, "datagram received");
        append_line(&mut log_file, line).await?;
        println!("{}", line);
    }
}
