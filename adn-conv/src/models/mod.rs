//! Data models for adn-conv

pub mod analysis;
pub mod job;
pub mod package;
pub mod sequence;

pub use analysis::{
    Aesthetics, AnalysisResult, Category, Classification, Grain, GrainKind, SequenceProfile,
    SymbolFrequencies, SYMBOL_ALPHABET, UNKNOWN_SUBJECT,
};
pub use job::{Job, JobStatus, JobUpdate, NewJob};
pub use package::{Package, PackageError};
pub use sequence::{validate_batch, SequenceInput};
