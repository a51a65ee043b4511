//! Sequence inputs submitted with a conversion job

use adn_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// One uploaded sequence file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceInput {
    pub name: String,
    /// Arbitrary text; only A/C/G/T/N (case-insensitive) counts as sequence data
    pub content: String,
}

impl SequenceInput {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Reject batches that cannot start a job: empty, or with a blank name
pub fn validate_batch(inputs: &[SequenceInput]) -> Result<()> {
    if inputs.is_empty() {
        return Err(Error::Validation("at least one sequence file is required".to_string()));
    }

    if let Some(position) = inputs.iter().position(|input| input.name.trim().is_empty()) {
        return Err(Error::Validation(format!(
            "sequence file #{} has an empty name",
            position + 1
        )));
    }

    Ok(())
}
