//! Pipeline stages and stage failures

use thiserror::Error;

/// Progress-checkpointed unit of pipeline work, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Initialize,
    ParseInputs,
    DeriveSecondaryMetrics,
    GenerateDescriptor,
    CompileOutputFormats,
    AssemblePackage,
    Complete,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Initialize,
        Stage::ParseInputs,
        Stage::DeriveSecondaryMetrics,
        Stage::GenerateDescriptor,
        Stage::CompileOutputFormats,
        Stage::AssemblePackage,
        Stage::Complete,
    ];

    /// Progress persisted when the stage starts
    pub fn progress(self) -> u8 {
        match self {
            Stage::Initialize => 0,
            Stage::ParseInputs => 10,
            Stage::DeriveSecondaryMetrics => 30,
            Stage::GenerateDescriptor => 50,
            Stage::CompileOutputFormats => 70,
            Stage::AssemblePackage => 90,
            Stage::Complete => 100,
        }
    }

    /// Client-facing `current_step` label
    pub fn label(self) -> &'static str {
        match self {
            Stage::Initialize => "Initializing",
            Stage::ParseInputs => "Parsing ADN Files",
            Stage::DeriveSecondaryMetrics => "Deriving Secondary Metrics",
            Stage::GenerateDescriptor => "Generating PIF",
            Stage::CompileOutputFormats => "Compiling Output Formats",
            Stage::AssemblePackage => "Creating ZIP Package",
            Stage::Complete => "Completed",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Initialize => "initialize",
            Stage::ParseInputs => "parse-inputs",
            Stage::DeriveSecondaryMetrics => "derive-secondary-metrics",
            Stage::GenerateDescriptor => "generate-descriptor",
            Stage::CompileOutputFormats => "compile-output-formats",
            Stage::AssemblePackage => "assemble-package",
            Stage::Complete => "complete",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Core stage failure; terminal for the job
#[derive(Debug, Error)]
#[error("{} failed: {}", .stage.label(), .message)]
pub struct StageError {
    pub stage: Stage,
    pub message: String,
}

impl StageError {
    pub fn new(stage: Stage, error: anyhow::Error) -> Self {
        Self {
            stage,
            message: format!("{:#}", error),
        }
    }

    /// For `map_err`: attribute an error to `stage`
    pub fn at(stage: Stage) -> impl FnOnce(anyhow::Error) -> StageError {
        move |error| StageError::new(stage, error)
    }
}
