//! Stages 50-90: descriptor, output formats, package

use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use super::{JobOrchestrator, Stage};
use crate::assembler::{Artifact, AssemblyContext, PresetDescriptor};
use crate::models::AnalysisResult;
use crate::services::package_store::StoredPackage;

impl JobOrchestrator {
    /// Fix the run's context (id, timestamp, preview) and build the PIF
    pub(super) async fn phase_generate_descriptor(
        &self,
        job_id: Uuid,
        result: &AnalysisResult,
        preview_image: Option<Vec<u8>>,
    ) -> Result<(PresetDescriptor, AssemblyContext)> {
        self.checkpoint(job_id, Stage::GenerateDescriptor).await?;
        self.log(job_id, "GENERATING PRESET INTERMEDIATE FORMAT (PIF)...")
            .await?;

        let context = AssemblyContext {
            job_id,
            generated_at: Utc::now(),
            preview_image,
        };
        let descriptor = self.assembler.descriptor(result, &context);

        self.pace().await;
        self.log(job_id, &format!("✓ PIF GENERATED: {}", descriptor.preset_id()))
            .await?;

        Ok((descriptor, context))
    }

    pub(super) async fn phase_compile_formats(
        &self,
        job_id: Uuid,
        result: &AnalysisResult,
        descriptor: &PresetDescriptor,
    ) -> Result<Vec<Artifact>> {
        self.checkpoint(job_id, Stage::CompileOutputFormats).await?;
        self.log(
            job_id,
            &format!(
                "CONVERTING TO KRITA, XMP AND 3D LUT ({}³) FORMATS...",
                self.assembler.lut_size()
            ),
        )
        .await?;

        let formats = self.assembler.output_formats(result, descriptor);

        self.pace().await;
        self.log(job_id, &format!("✓ {} OUTPUT FILES COMPILED", formats.len()))
            .await?;

        Ok(formats)
    }

    /// Build the package, encode the archive and store it under the job id
    pub(super) async fn phase_assemble_package(
        &self,
        job_id: Uuid,
        result: &AnalysisResult,
        descriptor: &PresetDescriptor,
        formats: Vec<Artifact>,
        context: &AssemblyContext,
    ) -> Result<StoredPackage> {
        self.checkpoint(job_id, Stage::AssemblePackage).await?;
        let job = self.log(job_id, "PACKAGING ASSETS...").await?;

        let package = self
            .assembler
            .package(result, descriptor, formats, context, &job.logs)
            .context("assembling package")?;
        let archive = package.to_archive().context("encoding archive")?;

        let stored = StoredPackage {
            archive,
            integrity_tag: result.integrity_tag.clone(),
            entry_count: package.len(),
        };
        let size = stored.archive.len();
        self.packages
            .insert(job_id, stored.clone())
            .await
            .context("storing package")?;

        tracing::info!(job_id = %job_id, entries = package.len(), bytes = size, "Package stored");

        self.pace().await;
        self.log(
            job_id,
            &format!("✓ ARCHIVE SEALED: {} FILES, {} BYTES", package.len(), size),
        )
        .await?;

        Ok(stored)
    }
}
