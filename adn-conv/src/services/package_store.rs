//! Finished packages, keyed by job id
//!
//! Write-once: a job's archive is stored exactly once and then served
//! unchanged for the life of the process.

use std::collections::HashMap;
use std::sync::Arc;

use adn_common::{Error, Result};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPackage {
    pub archive: Vec<u8>,
    pub integrity_tag: String,
    pub entry_count: usize,
}

impl StoredPackage {
    pub fn file_name(job_id: Uuid) -> String {
        format!("PRESET_PACKAGE_{}.zip", job_id)
    }
}

#[derive(Clone, Default)]
pub struct PackageStore {
    packages: Arc<RwLock<HashMap<Uuid, Arc<StoredPackage>>>>,
}

impl PackageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a package; a second insert for the same job is rejected
    pub async fn insert(&self, job_id: Uuid, package: StoredPackage) -> Result<Arc<StoredPackage>> {
        let mut packages = self.packages.write().await;
        if packages.contains_key(&job_id) {
            return Err(Error::InvalidTransition(format!(
                "package for job {} is already stored",
                job_id
            )));
        }
        let package = Arc::new(package);
        packages.insert(job_id, Arc::clone(&package));
        Ok(package)
    }

    pub async fn get(&self, job_id: Uuid) -> Option<Arc<StoredPackage>> {
        self.packages.read().await.get(&job_id).cloned()
    }

    /// Drop a package that was stored for a run that then failed
    pub async fn discard(&self, job_id: Uuid) -> bool {
        self.packages.write().await.remove(&job_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.packages.read().await.len()
    }
}
