//! Telemetry log analysis.
//!
//! The log is one event per line, 8 tab-separated fields:
//! participant, method, trial number, xy category, z category, elapsed time,
//! cumulative distance, event type. Events are grouped per
//! (participant, method, trial); a trial counts as completed when its final
//! event carries the completion sentinel, and completed trials contribute
//! their first-to-last time and distance deltas to the method averages.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event type marking the final event of a completed trial.
pub const DEFAULT_SENTINEL: &str = "TRIAL_END";

/// One parsed log line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub participant: u32,
    pub method: String,
    pub trial: u32,
    pub xy_type: String,
    pub z_type: String,
    pub time: f64,
    pub dist: f64,
    pub event_type: String,
}

/// Aggregate over one method's completed trials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodSummary {
    pub method: String,
    /// Completed trials that contributed to the averages.
    pub trials: usize,
    pub avg_time: f64,
    pub avg_dist: f64,
}

/// Full analysis output, saved as pretty JSON on request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub sentinel: String,
    /// Participant filter, if one was applied.
    pub participant: Option<u32>,
    pub methods: Vec<MethodSummary>,
}

impl AnalysisReport {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("writing report {}", path.display()))?;
        Ok(())
    }
}

/// Parse one log line. Malformed lines are fatal.
pub fn parse_line(line: &str) -> Result<LogEvent> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 8 {
        bail!("expected 8 tab-separated fields, got {}", fields.len());
    }
    Ok(LogEvent {
        participant: fields[0].parse().context("participant id")?,
        method: fields[1].to_string(),
        trial: fields[2].parse().context("trial number")?,
        xy_type: fields[3].to_string(),
        z_type: fields[4].to_string(),
        time: fields[5].parse().context("elapsed time")?,
        dist: fields[6].parse().context("cumulative distance")?,
        event_type: fields[7].to_string(),
    })
}

/// Read the whole log file, skipping blank lines.
pub fn read_log(path: impl AsRef<Path>) -> Result<Vec<LogEvent>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading log {}", path.display()))?;

    let mut events = Vec::new();
    for (number, line) in contents.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let event = parse_line(line)
            .with_context(|| format!("{}:{}", path.display(), number + 1))?;
        events.push(event);
    }
    Ok(events)
}

/// Compute per-method summaries over completed trials.
///
/// Methods are reported in order of first appearance in the log. A trial
/// group needs at least two events to express a delta.
pub fn analyze(events: &[LogEvent], sentinel: &str, participant: Option<u32>) -> AnalysisReport {
    let mut method_order: Vec<String> = Vec::new();
    let mut groups: BTreeMap<(u32, String, u32), Vec<&LogEvent>> = BTreeMap::new();

    for event in events {
        if participant.is_some_and(|p| p != event.participant) {
            continue;
        }
        if !method_order.contains(&event.method) {
            method_order.push(event.method.clone());
        }
        groups
            .entry((event.participant, event.method.clone(), event.trial))
            .or_default()
            .push(event);
    }

    let methods = method_order
        .into_iter()
        .map(|method| {
            let mut times = Vec::new();
            let mut dists = Vec::new();
            for ((_, group_method, _), group) in &groups {
                if *group_method != method || !is_completed(group, sentinel) {
                    continue;
                }
                let first = group[0];
                let last = group[group.len() - 1];
                times.push(last.time - first.time);
                dists.push(last.dist - first.dist);
            }
            MethodSummary {
                method,
                trials: times.len(),
                avg_time: mean(&times),
                avg_dist: mean(&dists),
            }
        })
        .collect();

    AnalysisReport {
        generated_at: Utc::now(),
        sentinel: sentinel.to_string(),
        participant,
        methods,
    }
}

fn is_completed(group: &[&LogEvent], sentinel: &str) -> bool {
    group.len() >= 2 && group[group.len() - 1].event_type == sentinel
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
