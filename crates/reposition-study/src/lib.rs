//! Study-session tooling around the trial-sequence generator:
//! - dispatch: push one block to the headset as a UDP datagram
//! - listener: collect per-trial telemetry datagrams into an append-only log
//! - analyzer: per-method summary statistics over the collected log

pub mod analyzer;
pub mod dispatch;
pub mod listener;
