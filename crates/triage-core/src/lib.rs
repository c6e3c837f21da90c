//! CI Triage Core
//!
//! Turns verbose build, test, and log query results into a compact,
//! triage-ordered view. This crate has no network dependencies; the three
//! external services are reached through the traits in [`service`].

pub mod aggregator;
pub mod builds;
pub mod detail;
pub mod error;
pub mod ids;
pub mod log_filter;
pub mod resolver;
pub mod results;
pub mod service;
pub mod status;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use aggregator::FailureAggregator;
pub use builds::{BuildDetail, BuildRecord, BuildRef, BuilderId};
pub use detail::BuildDetailFetcher;
pub use error::TriageError;
pub use ids::{BuildId, TaskId};
pub use log_filter::LogFilter;
pub use resolver::IdentityResolver;
pub use results::{GroupEntry, LogSnippet, TaskGroup, TestResult};
pub use service::{BuildService, LogService, TestResultService};
pub use status::{BuildStatus, TestStatus};
