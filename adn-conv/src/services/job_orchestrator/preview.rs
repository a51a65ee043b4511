//! Preview artwork side channel
//!
//! Runs between metric derivation and descriptor generation. The request
//! runs in its own task under a timeout and always resolves; a failure only
//! costs the package its `assets/preview.png`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use uuid::Uuid;

use super::JobOrchestrator;
use crate::models::AnalysisResult;
use crate::services::visual_asset_client::{VisualAssetError, VisualAssetService};

pub const PREVIEW_SIZE: &str = "1024x1024";

/// How the side channel resolved
#[derive(Debug)]
pub enum PreviewOutcome {
    Generated(Vec<u8>),
    Skipped,
    Failed(VisualAssetError),
}

/// Prompt describing the look to the image service
pub fn preview_prompt(result: &AnalysisResult) -> String {
    let aesthetics = &result.aesthetics;
    format!(
        "Painting study in the manner of {}, focused on {}. Saturation {}/100, contrast {}/100, {} grain.",
        result.classification.primary_subject,
        result.classification.category.label().to_lowercase(),
        aesthetics.saturation,
        aesthetics.contrast,
        aesthetics.grain.kind.as_str()
    )
}

/// Supervised generation: own task, bounded by `timeout`
pub async fn generate_supervised(
    service: Arc<dyn VisualAssetService>,
    prompt: String,
    timeout: Duration,
) -> PreviewOutcome {
    let task = tokio::spawn(async move {
        tokio::time::timeout(timeout, service.generate(&prompt, PREVIEW_SIZE)).await
    });

    match task.await {
        Ok(Ok(Ok(bytes))) if bytes.is_empty() => PreviewOutcome::Failed(VisualAssetError::EmptyResponse),
        Ok(Ok(Ok(bytes))) => PreviewOutcome::Generated(bytes),
        Ok(Ok(Err(e))) => PreviewOutcome::Failed(e),
        Ok(Err(_elapsed)) => PreviewOutcome::Failed(VisualAssetError::Timeout(timeout)),
        Err(join_error) => PreviewOutcome::Failed(VisualAssetError::TaskAborted(join_error.to_string())),
    }
}

impl JobOrchestrator {
    /// Only log persistence can fail here; preview errors are absorbed
    pub(super) async fn phase_preview(&self, job_id: Uuid, result: &AnalysisResult) -> Result<Option<Vec<u8>>> {
        let outcome = match &self.visual_assets {
            Some(service) => {
                self.log(job_id, "GENERATING PREVIEW ARTWORK...").await?;
                generate_supervised(
                    Arc::clone(service),
                    preview_prompt(result),
                    self.settings.preview_timeout,
                )
                .await
            }
            None => PreviewOutcome::Skipped,
        };

        match outcome {
            PreviewOutcome::Generated(bytes) => {
                self.log(
                    job_id,
                    &format!("✓ PREVIEW ARTWORK GENERATED ({} BYTES)", bytes.len()),
                )
                .await?;
                Ok(Some(bytes))
            }
            PreviewOutcome::Skipped => {
                self.log(job_id, "PREVIEW GENERATION SKIPPED (NO SERVICE CONFIGURED)")
                    .await?;
                Ok(None)
            }
            PreviewOutcome::Failed(error) => {
                tracing::warn!(job_id = %job_id, error = %error, "Preview generation failed");
                self.log(
                    job_id,
                    &format!("⚠ PREVIEW GENERATION FAILED: {}. CONTINUING WITHOUT PREVIEW.", error),
                )
                .await?;
                Ok(None)
            }
        }
    }
}
