//! Status enums for builds and test results.

use serde::{Deserialize, Serialize};

/// Status of a build as reported by the Build Service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    /// Build is queued.
    Scheduled,
    /// Build is running.
    Started,
    /// Build passed.
    Success,
    /// Build failed because of the code under test.
    Failure,
    /// Build failed because of the infrastructure.
    InfraFailure,
    /// Build was cancelled.
    Canceled,
    /// Status missing or not recognized.
    #[default]
    #[serde(other)]
    StatusUnspecified,
}

impl BuildStatus {
    /// Returns true if the build has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Failure | Self::InfraFailure | Self::Canceled
        )
    }

    /// Returns true if the build finished without passing.
    pub fn is_failing(&self) -> bool {
        matches!(self, Self::Failure | Self::InfraFailure | Self::Canceled)
    }
}

/// Status of a single test result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStatus {
    Pass,
    Fail,
    Crash,
    Abort,
    Skip,
    #[default]
    #[serde(other)]
    Unspecified,
}

impl TestStatus {
    /// Triage rank used when the same test appears more than once.
    ///
    /// Higher wins. This is a total order: crash > fail > abort > skip >
    /// pass > unspecified.
    pub fn triage_rank(&self) -> u8 {
        match self {
            Self::Crash => 5,
            Self::Fail => 4,
            Self::Abort => 3,
            Self::Skip => 2,
            Self::Pass => 1,
            Self::Unspecified => 0,
        }
    }
}
