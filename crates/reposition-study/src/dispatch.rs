//! Trial dispatch: push one block of the sequence document to the device.
//!
//! The datagram body is the block object augmented with `id` and `mode`
//! fields, serialized as a single JSON text. Plain UDP, no acknowledgment.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::UdpSocket;
use trial_sequence::sequence::Block;

/// Whether the device should record telemetry for this block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Test,
    Practice,
}

impl SessionMode {
    /// Wire code carried in the datagram.
    pub fn code(self) -> &'static str {
        match self {
            SessionMode::Test => "t",
            SessionMode::Practice => "p",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            SessionMode::Test => "TEST MODE: logs are recorded",
            SessionMode::Practice => "PRACTICE MODE: log is not recorded",
        }
    }
}

/// Build the datagram body for one block.
pub fn block_payload(block: &Block, participant: usize, mode: SessionMode) -> Result<String> {
    let mut value = serde_json::to_value(block)?;
    let object = value
        .as_object_mut()
        .context("block serializes to a JSON object")?;
    let _ = object.insert("id".to_string(), serde_json::Value::from(participant as u64));
    let _ = object.insert("mode".to_string(), serde_json::Value::from(mode.code()));
    Ok(value.to_string())
}

/// Fire the payload at the device from an ephemeral local port.
pub async fn send_datagram(payload: &str, target: SocketAddr) -> Result<usize> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .await
        .context("binding send socket")?;
    let sent = socket
        .send_to(payload.as_bytes(), target)
        .await
        .with_context(|| format!("sending datagram to {}", target))?;
    Ok(sent)
}
