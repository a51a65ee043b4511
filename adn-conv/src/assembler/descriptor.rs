//! Preset intermediate format (PIF) descriptor
//!
//! The canonical, format-neutral description of a preset. Every other
//! output format is compiled from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AnalysisResult, Category, GrainKind, SymbolFrequencies};

pub const PIF_VERSION: &str = "2.1.0";

/// Conformity score (percent) an output preset is expected to reach
pub const CONFORMITY_TARGET: u8 = 94;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetDescriptor {
    pub pif_version: String,
    pub metadata: DescriptorMetadata,
    pub metrics: DescriptorMetrics,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorMetadata {
    pub preset_id: String,
    pub subject: String,
    pub category: Category,
    pub job_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub integrity_tag: String,
    pub conformity_target: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorMetrics {
    pub symbol_frequencies: SymbolFrequencies,
    pub entropy: f64,
    pub symbol_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    Saturation { value: u8 },
    Contrast { value: u8 },
    Grain { kind: GrainKind, intensity: u32 },
}

impl PresetDescriptor {
    pub fn from_analysis(result: &AnalysisResult, job_id: Uuid, generated_at: DateTime<Utc>) -> Self {
        let aesthetics = &result.aesthetics;
        Self {
            pif_version: PIF_VERSION.to_string(),
            metadata: DescriptorMetadata {
                preset_id: preset_id(&result.integrity_tag),
                subject: result.classification.primary_subject.clone(),
                category: result.classification.category,
                job_id,
                generated_at,
                integrity_tag: result.integrity_tag.clone(),
                conformity_target: CONFORMITY_TARGET,
            },
            metrics: DescriptorMetrics {
                symbol_frequencies: result.symbol_frequencies,
                entropy: result.entropy,
                symbol_count: result.symbol_count,
            },
            operations: vec![
                Operation::Saturation {
                    value: aesthetics.saturation,
                },
                Operation::Contrast {
                    value: aesthetics.contrast,
                },
                Operation::Grain {
                    kind: aesthetics.grain.kind,
                    intensity: aesthetics.grain.intensity,
                },
            ],
        }
    }

    pub fn preset_id(&self) -> &str {
        &self.metadata.preset_id
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}

pub fn preset_id(integrity_tag: &str) -> String {
    format!("PRESET_{}", integrity_tag.to_uppercase())
}
