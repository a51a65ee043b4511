//! Artifact assembly
//!
//! Builds the downloadable [`Package`] from an [`AnalysisResult`]. The
//! assembler reads no clock, ids or global state; the caller supplies all of
//! that through [`AssemblyContext`], so equal inputs give equal packages.
//!
//! Assembly is split to match the pipeline's checkpoints:
//! [`ArtifactAssembler::descriptor`] → [`ArtifactAssembler::output_formats`]
//! → [`ArtifactAssembler::package`]. [`ArtifactAssembler::assemble`] runs all three.

pub mod color_tables;
pub mod descriptor;
pub mod listings;
pub mod presets;
pub mod summary;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{AnalysisResult, Classification, Package, PackageError};
use color_tables::{render_cube, CubeProfile};
pub use color_tables::DEFAULT_LUT_SIZE;
pub use descriptor::{PresetDescriptor, CONFORMITY_TARGET, PIF_VERSION};
pub use listings::Platform;

pub const DESCRIPTOR_PATH: &str = "metadata/pif.json";
pub const README_PATH: &str = "docs/README.md";
pub const SYSTEM_LOG_PATH: &str = "logs/system.log";
pub const PREVIEW_PATH: &str = "assets/preview.png";

/// Caller-supplied values the assembler may not produce itself
#[derive(Debug, Clone)]
pub struct AssemblyContext {
    pub job_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub preview_image: Option<Vec<u8>>,
}

/// One generated file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    fn text(path: String, body: String) -> Self {
        Self {
            path,
            bytes: body.into_bytes(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactAssembler {
    lut_size: usize,
}

impl Default for ArtifactAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_LUT_SIZE)
    }
}

impl ArtifactAssembler {
    pub fn new(lut_size: usize) -> Self {
        Self { lut_size }
    }

    pub fn lut_size(&self) -> usize {
        self.lut_size
    }

    /// Build every artifact and collect them into a package
    pub fn assemble(
        &self,
        result: &AnalysisResult,
        context: &AssemblyContext,
        log_snapshot: &[String],
    ) -> Result<Package, PackageError> {
        let descriptor = self.descriptor(result, context);
        let formats = self.output_formats(result, &descriptor);
        self.package(result, &descriptor, formats, context, log_snapshot)
    }

    pub fn descriptor(&self, result: &AnalysisResult, context: &AssemblyContext) -> PresetDescriptor {
        PresetDescriptor::from_analysis(result, context.job_id, context.generated_at)
    }

    /// Color tables and editor presets
    pub fn output_formats(&self, result: &AnalysisResult, descriptor: &PresetDescriptor) -> Vec<Artifact> {
        let stem = format!("{}_{}", name_prefix(&result.classification), result.integrity_tag);
        let aesthetics = &result.aesthetics;

        vec![
            Artifact::text(
                format!("luts/{}.cube", stem),
                render_cube(&stem, aesthetics, self.lut_size, CubeProfile::Standard),
            ),
            Artifact::text(
                format!("luts/{}_log.cube", stem),
                render_cube(&format!("{} (Log)", stem), aesthetics, self.lut_size, CubeProfile::Log),
            ),
            Artifact::text(
                format!("presets/{}.kpp", stem),
                presets::render_kpp(&stem, descriptor, aesthetics),
            ),
            Artifact::text(
                format!("presets/{}.xmp", stem),
                presets::render_xmp(&stem, descriptor, aesthetics),
            ),
        ]
    }

    /// Add descriptor, docs, listings, log and preview to the compiled formats
    pub fn package(
        &self,
        result: &AnalysisResult,
        descriptor: &PresetDescriptor,
        formats: Vec<Artifact>,
        context: &AssemblyContext,
        log_snapshot: &[String],
    ) -> Result<Package, PackageError> {
        let prefix = name_prefix(&result.classification);
        let mut artifacts = formats;

        artifacts.push(Artifact {
            path: DESCRIPTOR_PATH.to_string(),
            bytes: descriptor.to_json()?,
        });

        for platform in Platform::ALL {
            artifacts.push(Artifact::text(
                format!("marketing/{}.md", platform.slug()),
                listings::render_listing(platform, &result.classification, &result.integrity_tag),
            ));
        }

        let mut log_body = log_snapshot.join("\n");
        log_body.push('\n');
        artifacts.push(Artifact::text(SYSTEM_LOG_PATH.to_string(), log_body));

        if let Some(image) = &context.preview_image {
            artifacts.push(Artifact {
                path: PREVIEW_PATH.to_string(),
                bytes: image.clone(),
            });
        }

        let mut listed: Vec<String> = artifacts.iter().map(|a| a.path.clone()).collect();
        listed.push(README_PATH.to_string());
        listed.sort();
        let readme = summary::render_readme(&prefix, result, descriptor, &listed);
        artifacts.push(Artifact::text(README_PATH.to_string(), readme));

        let mut package = Package::new();
        for artifact in artifacts {
            package.insert(artifact.path, artifact.bytes)?;
        }
        Ok(package)
    }
}

/// `{subject}_{category}` with whitespace runs collapsed to `_`
pub fn name_prefix(classification: &Classification) -> String {
    format!("{} {}", classification.primary_subject, classification.category)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}
