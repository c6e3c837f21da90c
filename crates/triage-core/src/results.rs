//! Test result, task group, and log snippet types.

use serde::{Deserialize, Serialize};

use crate::{TaskId, TestStatus};

/// One test outcome, sourced verbatim from the Test Result Service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Test identifier, stable across reruns.
    pub test_id: String,

    /// Whether the outcome matched the test's declared expectation.
    pub expected: bool,

    /// Outcome status.
    pub status: TestStatus,

    /// Execution shard that produced the result.
    pub task_id: TaskId,

    /// Opaque handle used to fetch the result's logs.
    pub result_name: String,

    /// Invocation the result belongs to.
    pub invocation_id: String,

    /// The test both passed and failed unexpectedly within the build.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub flaky: bool,

    /// Primary error message, if the service reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl TestResult {
    /// Returns true if the outcome diverged from its expectation.
    pub fn is_unexpected(&self) -> bool {
        !self.expected
    }
}

/// A deduplicated result inside a task group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
    #[serde(flatten)]
    pub result: TestResult,

    /// Set on the first entry of each group only.
    pub root_failure: bool,
}

/// Unexpected failures of one execution shard, in triage order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskGroup {
    pub task_id: TaskId,
    pub entries: Vec<GroupEntry>,
}

impl TaskGroup {
    /// The triage-priority entry of this group.
    pub fn root_failure(&self) -> Option<&GroupEntry> {
        self.entries.first()
    }

    /// Number of entries in the group.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the group has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lines of a result's log that carry a recognized failure signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSnippet {
    pub result_name: String,
    pub lines: Vec<String>,
}

impl LogSnippet {
    /// Returns true if no line matched.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
