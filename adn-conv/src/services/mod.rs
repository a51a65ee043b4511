//! Service layer: job storage, orchestration and external clients

pub mod job_orchestrator;
pub mod job_store;
pub mod package_store;
pub mod visual_asset_client;

pub use job_orchestrator::{result_url, JobOrchestrator, PipelineSettings, Stage, StageError};
pub use job_store::{JobStore, MemoryJobStore};
pub use package_store::{PackageStore, StoredPackage};
pub use visual_asset_client::{HttpVisualAssetClient, VisualAssetError, VisualAssetService};
