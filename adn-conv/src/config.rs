//! Service configuration for adn-conv
//!
//! Values come from the optional TOML file first and are then overridden by
//! command-line arguments / environment variables (see `main.rs`).

use std::path::PathBuf;
use std::time::Duration;

use adn_common::config::TomlConfig;
use adn_common::{Error, Result};
use tracing::info;

use crate::assembler::color_tables::{MAX_LUT_SIZE, MIN_LUT_SIZE};
use crate::assembler::DEFAULT_LUT_SIZE;
use crate::services::visual_asset_client::DEFAULT_TIMEOUT_SECS;
use crate::services::PipelineSettings;

pub const DEFAULT_PORT: u16 = 5810;
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_STAGE_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct VisualAssetSettings {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub port: u16,
    pub root_folder: PathBuf,
    pub stage_delay_ms: u64,
    pub lut_size: usize,
    pub visual_asset: Option<VisualAssetSettings>,
}

/// Command-line / environment overrides; `None` keeps the TOML value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub stage_delay_ms: Option<u64>,
    pub lut_size: Option<usize>,
    pub preview_endpoint: Option<String>,
    pub preview_api_key: Option<String>,
}

impl ServiceConfig {
    /// Merge TOML values and overrides, then validate
    pub fn resolve(root_folder: PathBuf, toml: Option<&TomlConfig>, overrides: ConfigOverrides) -> Result<Self> {
        let default_toml = TomlConfig::default();
        let toml = toml.unwrap_or(&default_toml);

        let toml_visual = toml.visual_asset.as_ref();
        let endpoint = overrides
            .preview_endpoint
            .or_else(|| toml_visual.map(|v| v.endpoint.clone()))
            .filter(|e| !e.trim().is_empty());
        let visual_asset = endpoint.map(|endpoint| VisualAssetSettings {
            endpoint,
            api_key: overrides
                .preview_api_key
                .or_else(|| toml_visual.and_then(|v| v.api_key.clone())),
            timeout: Duration::from_secs(
                toml_visual
                    .and_then(|v| v.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        });

        let config = Self {
            bind_address: overrides
                .bind_address
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port: overrides.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            root_folder,
            stage_delay_ms: overrides
                .stage_delay_ms
                .or(toml.pipeline.stage_delay_ms)
                .unwrap_or(DEFAULT_STAGE_DELAY_MS),
            lut_size: overrides
                .lut_size
                .or(toml.pipeline.lut_size)
                .unwrap_or(DEFAULT_LUT_SIZE),
            visual_asset,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_LUT_SIZE..=MAX_LUT_SIZE).contains(&self.lut_size) {
            return Err(Error::Config(format!(
                "lut_size must be between {} and {}, got {}",
                MIN_LUT_SIZE, MAX_LUT_SIZE, self.lut_size
            )));
        }
        if let Some(visual) = &self.visual_asset {
            if visual.timeout.is_zero() {
                return Err(Error::Config("visual_asset.timeout_secs must be positive".to_string()));
            }
        }
        Ok(())
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            stage_delay: Duration::from_millis(self.stage_delay_ms),
            preview_timeout: self
                .visual_asset
                .as_ref()
                .map(|v| v.timeout)
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            lut_size: self.lut_size,
        }
    }

    pub fn log_summary(&self) {
        info!("Listen address: {}", self.listen_address());
        info!("Root folder: {}", self.root_folder.display());
        info!("Stage delay: {}ms, LUT size: {}", self.stage_delay_ms, self.lut_size);
        match &self.visual_asset {
            Some(visual) => info!("Preview service: {} (timeout {:?})", visual.endpoint, visual.timeout),
            None => info!("Preview service: not configured"),
        }
    }
}
