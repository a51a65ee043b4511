//! Stages 0-30: initialize, parse inputs, derive secondary metrics

use anyhow::Result;
use uuid::Uuid;

use super::{JobOrchestrator, Stage};
use crate::analyzer::SequenceAnalyzer;
use crate::models::{AnalysisResult, SequenceInput, SequenceProfile};

impl JobOrchestrator {
    pub(super) async fn phase_initialize(&self, job_id: Uuid) -> Result<()> {
        self.checkpoint(job_id, Stage::Initialize).await?;
        self.log(job_id, "INITIATING CONVERSION PIPELINE V2.1").await?;
        Ok(())
    }

    /// Measure the batch: frequencies, entropy, classification, integrity tag
    pub(super) async fn phase_parse_inputs(
        &self,
        job_id: Uuid,
        inputs: &[SequenceInput],
    ) -> Result<SequenceProfile> {
        self.checkpoint(job_id, Stage::ParseInputs).await?;
        self.log(job_id, &format!("PARSING {} ADN FILES...", inputs.len()))
            .await?;
        for input in inputs {
            self.log(job_id, &format!("  · {} ({} BYTES)", input.name, input.content.len()))
                .await?;
        }

        self.pace().await;
        let profile = self.analyzer.profile(inputs);

        self.log(
            job_id,
            &format!(
                "✓ PARSING COMPLETE. {} SYMBOLS RETAINED FROM {} BYTES.",
                profile.symbol_count, profile.raw_length
            ),
        )
        .await?;
        self.log(
            job_id,
            &format!(
                "CLASSIFIED AS {} / {} (TAG {})",
                profile.classification.primary_subject.to_uppercase(),
                profile.classification.category.label().to_uppercase(),
                profile.integrity_tag
            ),
        )
        .await?;

        Ok(profile)
    }

    /// Map the profile onto saturation, contrast and grain
    pub(super) async fn phase_derive_metrics(
        &self,
        job_id: Uuid,
        profile: SequenceProfile,
    ) -> Result<AnalysisResult> {
        self.checkpoint(job_id, Stage::DeriveSecondaryMetrics).await?;
        self.log(
            job_id,
            &format!("DERIVING SECONDARY METRICS (ENTROPY {:.4} BITS)...", profile.entropy),
        )
        .await?;

        self.pace().await;
        let aesthetics = SequenceAnalyzer::derive_aesthetics(&profile);
        let result = AnalysisResult::from_parts(profile, aesthetics);

        self.log(
            job_id,
            &format!(
                "✓ SATURATION {} · CONTRAST {} · GRAIN {} ({})",
                aesthetics.saturation,
                aesthetics.contrast,
                aesthetics.grain.kind.as_str().to_uppercase(),
                aesthetics.grain.intensity
            ),
        )
        .await?;

        Ok(result)
    }
}
