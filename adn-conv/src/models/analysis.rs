//! Analysis result types
//!
//! A [`SequenceProfile`] holds everything measured directly from the inputs;
//! [`Aesthetics`] are derived from it. [`AnalysisResult`] joins the two and is
//! never mutated once built.

use serde::{Deserialize, Serialize};

/// Recognized sequence symbols, in canonical order
pub const SYMBOL_ALPHABET: [char; 5] = ['A', 'C', 'G', 'T', 'N'];

/// Relative frequency of each alphabet symbol
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolFrequencies {
    pub a: f64,
    pub c: f64,
    pub g: f64,
    pub t: f64,
    pub n: f64,
}

impl SymbolFrequencies {
    /// Build from per-symbol counts in [`SYMBOL_ALPHABET`] order
    pub fn from_counts(counts: [usize; 5], length: usize) -> Self {
        let length = length.max(1) as f64;
        let f = |i: usize| counts[i] as f64 / length;
        Self {
            a: f(0),
            c: f(1),
            g: f(2),
            t: f(3),
            n: f(4),
        }
    }

    pub fn as_array(&self) -> [f64; 5] {
        [self.a, self.c, self.g, self.t, self.n]
    }

    /// (symbol, frequency) pairs in alphabet order
    pub fn iter(&self) -> impl Iterator<Item = (char, f64)> {
        SYMBOL_ALPHABET.into_iter().zip(self.as_array())
    }

    pub fn gc_content(&self) -> f64 {
        self.g + self.c
    }
}

/// Artistic category of a sequence batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Composition,
    Color,
    Light,
    Finish,
    General,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Composition => "Composition",
            Category::Color => "Color",
            Category::Light => "Light",
            Category::Finish => "Finish",
            Category::General => "General",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub const UNKNOWN_SUBJECT: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub primary_subject: String,
    pub category: Category,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            primary_subject: UNKNOWN_SUBJECT.to_string(),
            category: Category::General,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrainKind {
    Fine,
    Coarse,
}

impl GrainKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GrainKind::Fine => "fine",
            GrainKind::Coarse => "coarse",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grain {
    pub kind: GrainKind,
    pub intensity: u32,
}

/// Image-processing parameters derived from a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aesthetics {
    /// 0-100
    pub saturation: u8,
    /// 0-100
    pub contrast: u8,
    pub grain: Grain,
}

/// Measurements taken directly from a batch of inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceProfile {
    pub input_count: usize,
    /// Bytes across all inputs before filtering
    pub raw_length: usize,
    /// Alphabet symbols retained after filtering
    pub symbol_count: usize,
    pub symbol_frequencies: SymbolFrequencies,
    /// Shannon entropy in bits, within [0, log2(5)]
    pub entropy: f64,
    pub classification: Classification,
    /// 16 lowercase hex characters
    pub integrity_tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub input_count: usize,
    pub raw_length: usize,
    pub symbol_count: usize,
    pub symbol_frequencies: SymbolFrequencies,
    pub entropy: f64,
    pub aesthetics: Aesthetics,
    pub classification: Classification,
    pub integrity_tag: String,
}

impl AnalysisResult {
    pub fn from_parts(profile: SequenceProfile, aesthetics: Aesthetics) -> Self {
        Self {
            input_count: profile.input_count,
            raw_length: profile.raw_length,
            symbol_count: profile.symbol_count,
            symbol_frequencies: profile.symbol_frequencies,
            entropy: profile.entropy,
            aesthetics,
            classification: profile.classification,
            integrity_tag: profile.integrity_tag,
        }
    }
}
