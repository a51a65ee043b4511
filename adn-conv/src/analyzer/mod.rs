//! Sequence analysis
//!
//! Turns a batch of [`SequenceInput`]s into an [`AnalysisResult`]. Everything
//! here is pure: no clock, no I/O, no shared state.
//!
//! Analysis runs in two steps so callers can checkpoint between them:
//! [`SequenceAnalyzer::profile`] measures the inputs (frequencies, entropy,
//! classification, integrity tag) and [`SequenceAnalyzer::derive_aesthetics`]
//! maps the measurements onto image-processing parameters.

pub mod markers;

use sha2::{Digest, Sha256};

use crate::models::{
    Aesthetics, AnalysisResult, Category, Classification, Grain, GrainKind, SequenceInput,
    SequenceProfile, SymbolFrequencies, SYMBOL_ALPHABET,
};
pub use markers::{default_categories, default_subjects, MarkerEntry, MarkerTable};

/// log2 of the alphabet size; upper bound of the entropy
pub const MAX_ENTROPY: f64 = 2.321_928_094_887_362;

/// Entropy above which grain is reported as coarse
pub const COARSE_GRAIN_THRESHOLD: f64 = 1.5;

/// Hex characters kept from the SHA-256 digest
pub const INTEGRITY_TAG_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct SequenceAnalyzer {
    subjects: MarkerTable<String>,
    categories: MarkerTable<Category>,
}

impl Default for SequenceAnalyzer {
    fn default() -> Self {
        Self::new(default_subjects(), default_categories())
    }
}

impl SequenceAnalyzer {
    pub fn new(subjects: MarkerTable<String>, categories: MarkerTable<Category>) -> Self {
        Self { subjects, categories }
    }

    pub fn analyze(&self, inputs: &[SequenceInput]) -> AnalysisResult {
        let profile = self.profile(inputs);
        let aesthetics = Self::derive_aesthetics(&profile);
        AnalysisResult::from_parts(profile, aesthetics)
    }

    /// Measure a batch of inputs
    pub fn profile(&self, inputs: &[SequenceInput]) -> SequenceProfile {
        let mut counts = [0usize; 5];
        for byte in inputs.iter().flat_map(|input| filter_symbols(&input.content)) {
            if let Some(index) = symbol_index(byte) {
                counts[index] += 1;
            }
        }
        let symbol_count: usize = counts.iter().sum();

        let symbol_frequencies = SymbolFrequencies::from_counts(counts, symbol_count);
        let entropy = shannon_entropy(&symbol_frequencies);

        SequenceProfile {
            input_count: inputs.len(),
            raw_length: inputs.iter().map(|input| input.content.len()).sum(),
            symbol_count,
            symbol_frequencies,
            entropy,
            classification: self.classify(inputs),
            integrity_tag: integrity_tag(&counts),
        }
    }

    /// Map measurements onto saturation, contrast and grain
    pub fn derive_aesthetics(profile: &SequenceProfile) -> Aesthetics {
        let saturation = to_percent(profile.symbol_frequencies.gc_content());
        let contrast = to_percent(profile.entropy / MAX_ENTROPY);

        let kind = if profile.entropy > COARSE_GRAIN_THRESHOLD {
            GrainKind::Coarse
        } else {
            GrainKind::Fine
        };

        Aesthetics {
            saturation,
            contrast,
            grain: Grain {
                kind,
                intensity: (profile.entropy * 10.0).round().max(0.0) as u32,
            },
        }
    }

    /// Subject and category are matched independently; within one input the
    /// first table row wins, across inputs the last match wins.
    pub fn classify(&self, inputs: &[SequenceInput]) -> Classification {
        let mut classification = Classification::default();

        for input in inputs {
            let haystack = format!("{}\n{}", input.name, input.content).to_lowercase();

            if let Some(subject) = self.subjects.first_match(&haystack) {
                classification.primary_subject = subject.clone();
            }
            if let Some(category) = self.categories.first_match(&haystack) {
                classification.category = *category;
            }
        }

        classification
    }
}

/// Upper-cased alphabet symbols of `content`, everything else dropped
fn filter_symbols(content: &str) -> Vec<u8> {
    content
        .bytes()
        .map(|b| b.to_ascii_uppercase())
        .filter(|b| symbol_index(*b).is_some())
        .collect()
}

fn symbol_index(byte: u8) -> Option<usize> {
    SYMBOL_ALPHABET.iter().position(|s| *s as u8 == byte)
}

fn shannon_entropy(frequencies: &SymbolFrequencies) -> f64 {
    let entropy: f64 = frequencies
        .as_array()
        .iter()
        .filter(|f| **f > 0.0)
        .map(|f| -f * f.log2())
        .sum();
    entropy.clamp(0.0, MAX_ENTROPY)
}

fn to_percent(ratio: f64) -> u8 {
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Digest of the filtered buffer in canonical (sorted) form
///
/// Hashing `A{count}C{count}...` equals hashing the sorted symbol bytes, so
/// neither input order nor how symbols are split across inputs matters.
fn integrity_tag(counts: &[usize; 5]) -> String {
    let mut hasher = Sha256::new();
    for (symbol, count) in SYMBOL_ALPHABET.iter().zip(counts) {
        hasher.update(format!("{}{}\n", symbol, count).as_bytes());
    }

    let digest = hasher.finalize();
    let mut tag: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    tag.truncate(INTEGRITY_TAG_LEN);
    tag
}
