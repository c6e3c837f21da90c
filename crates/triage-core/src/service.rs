//! Service boundaries consumed by the triage components.
//!
//! Implement these traits to bind the components to a transport. The
//! components never retry; retries, if any, belong to the implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::{BuildDetail, BuildId, BuildRecord, BuildRef, BuilderId, TestResult};

/// Canonical build metadata.
#[async_trait]
pub trait BuildService: Send + Sync {
    /// Look up builds by builder and build number.
    ///
    /// Returns every match; more than one is a contract violation the
    /// caller reports.
    async fn find_by_number(&self, builder: &BuilderId, number: u32) -> Result<Vec<BuildRef>>;

    /// Latest patchset number of a change, or `None` if the change is unknown.
    async fn latest_patchset(&self, host: &str, change: u64) -> Result<Option<u32>>;

    /// All builds associated with one patchset of a change, any status.
    async fn search_by_change(
        &self,
        host: &str,
        change: u64,
        patchset: u32,
    ) -> Result<Vec<BuildRecord>>;

    /// Full record of a build, or `None` if the id is unknown.
    async fn get_build(&self, id: BuildId) -> Result<Option<BuildDetail>>;
}

/// Structured test outcomes.
#[async_trait]
pub trait TestResultService: Send + Sync {
    /// Every result recorded for the build, in the service's native order.
    ///
    /// Implementations must collect all pages before returning.
    async fn list_results(&self, build: &BuildRef) -> Result<Vec<TestResult>>;
}

/// Raw execution logs.
#[async_trait]
pub trait LogService: Send + Sync {
    /// Raw log text for a result, or `None` if absent or expired.
    async fn fetch_raw_log(&self, result_name: &str) -> Result<Option<String>>;
}
