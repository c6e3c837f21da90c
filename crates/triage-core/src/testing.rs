//! In-memory service fakes for component tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::Result;
use crate::{
    BuildDetail, BuildId, BuildRecord, BuildRef, BuildService, BuildStatus, BuilderId, LogService,
    TaskId, TestResult, TestResultService, TestStatus, TriageError,
};

pub fn builder(name: &str) -> BuilderId {
    BuilderId::new("chromium", "ci", name)
}

pub fn build_ref(id: u64, name: &str, number: u32) -> BuildRef {
    BuildRef::new(BuildId::new(id), builder(name), number)
}

/// Unexpected result for `test_id` on `task`.
pub fn unexpected(test_id: &str, task: &str, status: TestStatus) -> TestResult {
    TestResult {
        test_id: test_id.to_string(),
        expected: false,
        status,
        task_id: TaskId::new(task),
        result_name: format!(
            "invocations/task-{}/tests/{}/results/{}",
            task,
            test_id,
            format!("{:?}", status).to_lowercase()
        ),
        invocation_id: format!("task-{}", task),
        flaky: false,
        failure_reason: None,
    }
}

pub fn expected(test_id: &str, task: &str, status: TestStatus) -> TestResult {
    TestResult {
        expected: true,
        ..unexpected(test_id, task, status)
    }
}

#[derive(Default)]
pub struct FakeBuildService {
    pub by_number: HashMap<(String, u32), Vec<BuildRef>>,
    pub latest: HashMap<u64, u32>,
    pub by_change: HashMap<(u64, u32), Vec<BuildRecord>>,
    pub details: HashMap<BuildId, BuildDetail>,
    pub unavailable: bool,
}

impl FakeBuildService {
    fn check(&self) -> Result<()> {
        if self.unavailable {
            return Err(TriageError::Service("buildbucket: 503".to_string()));
        }
        Ok(())
    }

    pub fn with_change_build(mut self, change: u64, patchset: u32, build: BuildRef, status: BuildStatus) -> Self {
        self.by_change
            .entry((change, patchset))
            .or_default()
            .push(BuildRecord { build, status });
        self
    }
}

#[async_trait]
impl BuildService for FakeBuildService {
    async fn find_by_number(&self, builder: &BuilderId, number: u32) -> Result<Vec<BuildRef>> {
        self.check()?;
        Ok(self
            .by_number
            .get(&(builder.builder.clone(), number))
            .cloned()
            .unwrap_or_default())
    }

    async fn latest_patchset(&self, _host: &str, change: u64) -> Result<Option<u32>> {
        self.check()?;
        Ok(self.latest.get(&change).copied())
    }

    async fn search_by_change(
        &self,
        _host: &str,
        change: u64,
        patchset: u32,
    ) -> Result<Vec<BuildRecord>> {
        self.check()?;
        Ok(self
            .by_change
            .get(&(change, patchset))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_build(&self, id: BuildId) -> Result<Option<BuildDetail>> {
        self.check()?;
        Ok(self.details.get(&id).cloned())
    }
}

#[derive(Default)]
pub struct FakeResultService {
    pub results: HashMap<BuildId, Vec<TestResult>>,
    pub failing_builds: Vec<BuildId>,
    pub calls: AtomicUsize,
}

impl FakeResultService {
    pub fn with_results(mut self, build: &BuildRef, results: Vec<TestResult>) -> Self {
        self.results.insert(build.id, results);
        self
    }
}

#[async_trait]
impl TestResultService for FakeResultService {
    async fn list_results(&self, build: &BuildRef) -> Result<Vec<TestResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_builds.contains(&build.id) {
            return Err(TriageError::Service(format!(
                "resultdb: deadline exceeded for build {}",
                build.id
            )));
        }
        Ok(self.results.get(&build.id).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeLogService {
    pub logs: HashMap<String, String>,
    pub unavailable: bool,
}

#[async_trait]
impl LogService for FakeLogService {
    async fn fetch_raw_log(&self, result_name: &str) -> Result<Option<String>> {
        if self.unavailable {
            return Err(TriageError::Service("artifact fetch timed out".to_string()));
        }
        Ok(self.logs.get(result_name).cloned())
    }
}
