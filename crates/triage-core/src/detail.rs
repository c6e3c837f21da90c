//! Build Detail Fetcher.

use std::sync::Arc;

use crate::error::Result;
use crate::{BuildDetail, BuildId, BuildRef, BuildService, TriageError};

/// Pass-through projection of the Build Service's build record.
pub struct BuildDetailFetcher {
    builds: Arc<dyn BuildService>,
}

impl BuildDetailFetcher {
    pub fn new(builds: Arc<dyn BuildService>) -> Self {
        Self { builds }
    }

    /// Status, summary, and output properties of a build.
    pub async fn get_build(&self, build: &BuildRef) -> Result<BuildDetail> {
        self.get_build_by_id(build.id).await
    }

    /// Same as [`get_build`](Self::get_build) when only the id is at hand.
    pub async fn get_build_by_id(&self, id: BuildId) -> Result<BuildDetail> {
        self.builds
            .get_build(id)
            .await?
            .ok_or_else(|| TriageError::NotFound(format!("build {}", id)))
    }
}
