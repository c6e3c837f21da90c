//! Identity Resolver: builder/number and change/patchset to canonical builds.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::{BuildId, BuildRef, BuildService, BuilderId, TriageError};

/// Maps human-facing build coordinates to canonical [`BuildRef`]s.
pub struct IdentityResolver {
    builds: Arc<dyn BuildService>,
}

impl IdentityResolver {
    pub fn new(builds: Arc<dyn BuildService>) -> Self {
        Self { builds }
    }

    /// Resolve one build from its builder and build number.
    pub async fn resolve_by_builder(&self, builder: &BuilderId, build_number: u32) -> Result<BuildRef> {
        if builder.builder.is_empty() {
            return Err(TriageError::Argument("builder name is empty".to_string()));
        }
        if build_number == 0 {
            return Err(TriageError::Argument("build number must be positive".to_string()));
        }

        let mut found = self.builds.find_by_number(builder, build_number).await?;
        debug!(builder = %builder, build_number, matches = found.len(), "Resolved builder build");

        match found.len() {
            0 => Err(TriageError::NotFound(format!("build {}/{}", builder, build_number))),
            1 => Ok(found.remove(0)),
            n => Err(TriageError::Service(format!(
                "{} builds share number {} on builder {}",
                n, build_number, builder
            ))),
        }
    }

    /// Canonical identity of a build known only by id.
    pub async fn resolve_by_id(&self, id: BuildId) -> Result<BuildRef> {
        self.builds
            .get_build(id)
            .await?
            .map(|detail| detail.build)
            .ok_or_else(|| TriageError::NotFound(format!("build {}", id)))
    }

    /// Failing builds for a change.
    ///
    /// With no patchset, the latest patchset is used. Builds that are still
    /// running or that passed are excluded; no builds is an empty result.
    pub async fn resolve_by_change(
        &self,
        host: &str,
        change_id: u64,
        patchset: Option<u32>,
    ) -> Result<Vec<BuildRef>> {
        if change_id == 0 {
            return Err(TriageError::Argument("change id must be positive".to_string()));
        }

        let patchset = match patchset {
            Some(0) => {
                return Err(TriageError::Argument("patchset must be positive".to_string()));
            }
            Some(ps) => ps,
            None => self
                .builds
                .latest_patchset(host, change_id)
                .await?
                .ok_or_else(|| TriageError::NotFound(format!("change {} on {}", change_id, host)))?,
        };

        let records = self.builds.search_by_change(host, change_id, patchset).await?;
        let total = records.len();
        let failing: Vec<BuildRef> = records
            .into_iter()
            .filter(|r| r.status.is_failing())
            .map(|r| r.build)
            .collect();

        debug!(
            change_id,
            patchset,
            total,
            failing = failing.len(),
            "Resolved change builds"
        );
        Ok(failing)
    }
}
