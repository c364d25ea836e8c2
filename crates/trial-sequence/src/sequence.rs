//! The sequence document: the on-disk contract between the generator and the
//! trial-dispatch side.
//!
//! Top-level keys are participant IDs rendered as strings; values are ordered
//! block lists. Downstream consumers index `document[participant][block]` and
//! expect a `method` field and a `trials` array. Both pretty and compact JSON
//! forms are accepted on load.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One trial: categorical tags plus concrete start/target positions.
///
/// Coordinates are 3-decimal strings, not floats, so regenerating with the
/// same seed reproduces the file exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    pub z_type: String,
    pub xy_type: String,
    pub start: [String; 3],
    pub target: [String; 3],
}

/// One block: an interaction method and its shuffled trial list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub method: String,
    pub trials: Vec<Trial>,
}

/// The full generated document, keyed by participant ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceDocument {
    pub participants: BTreeMap<String, Vec<Block>>,
}

impl SequenceDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, participant: usize, blocks: Vec<Block>) {
        let _ = self.participants.insert(participant.to_string(), blocks);
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Ordered block list for a participant, if present.
    pub fn blocks(&self, participant: usize) -> Option<&[Block]> {
        self.participants
            .get(&participant.to_string())
            .map(Vec::as_slice)
    }

    /// Single block lookup, the dispatch path's access pattern.
    pub fn block(&self, participant: usize, index: usize) -> Option<&Block> {
        self.blocks(participant)?.get(index)
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// Write the whole document in one pass.
    pub fn save(&self, path: impl AsRef<Path>, pretty: bool) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json(pretty)?)
            .with_context(|| format!("writing sequence file {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading sequence file {}", path.display()))?;
        let document = serde_json::from_str(&json)
            .with_context(|| format!("parsing sequence file {}", path.display()))?;
        Ok(document)
    }
}
