//! Failure Aggregator: unexpected failures, deduplicated and grouped by shard.
//!
//! The listing is built from the complete result set of a build. Results are
//! filtered to unexpected outcomes, deduplicated by test id, grouped by task
//! id in first-occurrence order, and the first entry of every group is marked
//! as the root failure. The service's native ordering is taken as
//! authoritative; nothing is re-sorted.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

use crate::error::Result;
use crate::{BuildRef, GroupEntry, TaskGroup, TaskId, TestResult, TestResultService, TriageError};

/// Default number of builds listed concurrently.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Lists unexpected test failures of a build in triage order.
pub struct FailureAggregator {
    results: Arc<dyn TestResultService>,
}

impl FailureAggregator {
    pub fn new(results: Arc<dyn TestResultService>) -> Self {
        Self { results }
    }

    /// Task groups of unexpected failures for one build.
    ///
    /// All or nothing: a service error yields no partial listing.
    pub async fn list_failures(&self, build: &BuildRef) -> Result<Vec<TaskGroup>> {
        let raw = self.results.list_results(build).await?;
        let total = raw.len();
        let groups = aggregate(raw);

        info!(
            build_id = %build.id,
            results = total,
            groups = groups.len(),
            failures = groups.iter().map(TaskGroup::len).sum::<usize>(),
            "Aggregated failures"
        );
        Ok(groups)
    }

    /// Task groups for several builds, listed with bounded parallelism.
    ///
    /// Output order follows `builds`. The first failing build aborts the
    /// whole listing.
    pub async fn list_failures_for_builds(
        &self,
        builds: &[BuildRef],
        concurrency: usize,
    ) -> Result<Vec<(BuildRef, Vec<TaskGroup>)>> {
        stream::iter(builds)
            .map(|build| async move {
                let groups = self.list_failures(build).await?;
                Ok::<_, TriageError>((build.clone(), groups))
            })
            .buffered(concurrency.max(1))
            .try_collect()
            .await
    }
}

/// Turn raw results into ordered task groups.
pub fn aggregate(results: Vec<TestResult>) -> Vec<TaskGroup> {
    let deduped = dedupe_unexpected(results);
    debug!(unique = deduped.len(), "Deduplicated unexpected results");
    group_by_task(deduped)
}

/// Keep one unexpected result per test id.
///
/// The highest [`TestStatus::triage_rank`](crate::TestStatus::triage_rank)
/// wins; ties keep the earliest. Each test keeps the stream position of its
/// first occurrence.
fn dedupe_unexpected(results: Vec<TestResult>) -> Vec<TestResult> {
    let mut kept: Vec<TestResult> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for result in results.into_iter().filter(TestResult::is_unexpected) {
        match index.get(&result.test_id) {
            Some(&pos) => {
                if result.status.triage_rank() > kept[pos].status.triage_rank() {
                    kept[pos] = result;
                }
            }
            None => {
                index.insert(result.test_id.clone(), kept.len());
                kept.push(result);
            }
        }
    }

    kept
}

/// Group by task id in first-occurrence order and flag each group's head.
fn group_by_task(results: Vec<TestResult>) -> Vec<TaskGroup> {
    let mut groups: Vec<TaskGroup> = Vec::new();
    let mut index: HashMap<TaskId, usize> = HashMap::new();

    for result in results {
        let pos = *index.entry(result.task_id.clone()).or_insert_with(|| {
            groups.push(TaskGroup {
                task_id: result.task_id.clone(),
                entries: Vec::new(),
            });
            groups.len() - 1
        });

        let group = &mut groups[pos];
        let root_failure = group.entries.is_empty();
        group.entries.push(GroupEntry {
            result,
            root_failure,
        });
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{build_ref, expected, unexpected, FakeResultService};
    use crate::TestStatus;
    use std::collections::HashSet;
    use std::sync::atomic::Ordering;

    fn ids(group: &TaskGroup) -> Vec<&str> {
        group.entries.iter().map(|e| e.result.test_id.as_str()).collect()
    }

    fn task_ids(groups: &[TaskGroup]) -> Vec<&str> {
        groups.iter().map(|g| g.task_id.as_str()).collect()
    }

    #[test]
    fn test_expected_results_dropped() {
        let groups = aggregate(vec![
            expected("flaky.a", "t1", TestStatus::Fail),
            expected("ok.b", "t1", TestStatus::Pass),
            unexpected("broken.c", "t2", TestStatus::Fail),
        ]);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].task_id.as_str(), "t2");
        assert_eq!(ids(&groups[0]), vec!["broken.c"]);
    }

    #[test]
    fn test_duplicates_collapse_to_one() {
        let groups = aggregate(vec![
            unexpected("suite.a", "t1", TestStatus::Fail),
            unexpected("suite.b", "t1", TestStatus::Fail),
            unexpected("suite.a", "t1", TestStatus::Fail),
            unexpected("suite.a", "t1", TestStatus::Fail),
        ]);

        let all: Vec<&str> = groups.iter().flat_map(ids).collect();
        assert_eq!(all, vec!["suite.a", "suite.b"]);
    }

    #[test]
    fn test_crash_preferred_over_fail() {
        let groups = aggregate(vec![
            unexpected("suite.a", "t1", TestStatus::Fail),
            unexpected("suite.a", "t1", TestStatus::Crash),
        ]);
        assert_eq!(groups[0].entries[0].result.status, TestStatus::Crash);

        let groups = aggregate(vec![
            unexpected("suite.a", "t1", TestStatus::Crash),
            unexpected("suite.a", "t1", TestStatus::Fail),
        ]);
        assert_eq!(groups[0].entries[0].result.status, TestStatus::Crash);
    }

    #[test]
    fn test_equal_status_keeps_first_encountered() {
        let mut first = unexpected("suite.a", "t1", TestStatus::Fail);
        first.result_name = "invocations/task-t1/tests/suite.a/results/first".to_string();
        let mut second = unexpected("suite.a", "t1", TestStatus::Fail);
        second.result_name = "invocations/task-t1/tests/suite.a/results/second".to_string();

        let groups = aggregate(vec![first, second]);
        assert!(groups[0].entries[0].result.result_name.ends_with("/first"));
    }

    #[test]
    fn test_fail_preferred_over_abort_and_skip() {
        let groups = aggregate(vec![
            unexpected("suite.a", "t1", TestStatus::Skip),
            unexpected("suite.a", "t1", TestStatus::Abort),
            unexpected("suite.a", "t1", TestStatus::Fail),
        ]);
        assert_eq!(groups[0].entries[0].result.status, TestStatus::Fail);
    }

    #[test]
    fn test_groups_in_first_occurrence_order() {
        let groups = aggregate(vec![
            unexpected("x.1", "zeta", TestStatus::Fail),
            unexpected("x.2", "alpha", TestStatus::Fail),
            unexpected("x.3", "zeta", TestStatus::Crash),
            unexpected("x.4", "mid", TestStatus::Fail),
            unexpected("x.5", "alpha", TestStatus::Fail),
        ]);

        assert_eq!(task_ids(&groups), vec!["zeta", "alpha", "mid"]);
        assert_eq!(ids(&groups[0]), vec!["x.1", "x.3"]);
        assert_eq!(ids(&groups[1]), vec!["x.2", "x.5"]);
    }

    #[test]
    fn test_expected_results_do_not_create_groups() {
        let groups = aggregate(vec![
            expected("x.0", "early", TestStatus::Fail),
            unexpected("x.1", "late", TestStatus::Fail),
            unexpected("x.2", "early", TestStatus::Fail),
        ]);
        assert_eq!(task_ids(&groups), vec!["late", "early"]);
    }

    #[test]
    fn test_root_failure_flag_on_first_entry_only() {
        let groups = aggregate(vec![
            unexpected("a", "t1", TestStatus::Crash),
            unexpected("b", "t1", TestStatus::Fail),
            unexpected("c", "t2", TestStatus::Fail),
            unexpected("d", "t1", TestStatus::Fail),
        ]);

        for group in &groups {
            let flags: Vec<bool> = group.entries.iter().map(|e| e.root_failure).collect();
            assert!(flags[0]);
            assert_eq!(flags.iter().filter(|f| **f).count(), 1);
        }
        assert_eq!(groups[0].root_failure().unwrap().result.test_id, "a");
    }

    #[test]
    fn test_grouping_is_complete() {
        let raw = vec![
            unexpected("a", "t1", TestStatus::Fail),
            unexpected("b", "t2", TestStatus::Crash),
            expected("c", "t2", TestStatus::Fail),
            unexpected("d", "t3", TestStatus::Fail),
            unexpected("a", "t1", TestStatus::Crash),
            unexpected("e", "t2", TestStatus::Abort),
        ];
        let unexpected_ids: HashSet<String> = raw
            .iter()
            .filter(|r| !r.expected)
            .map(|r| r.test_id.clone())
            .collect();

        let groups = aggregate(raw);
        let listed: Vec<String> = groups
            .iter()
            .flat_map(|g| g.entries.iter().map(|e| e.result.test_id.clone()))
            .collect();

        assert_eq!(listed.len(), unexpected_ids.len());
        assert_eq!(listed.into_iter().collect::<HashSet<_>>(), unexpected_ids);

        let task_set: HashSet<&str> = task_ids(&groups).into_iter().collect();
        assert_eq!(task_set.len(), groups.len());
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn test_list_failures_is_idempotent() {
        let build = build_ref(1, "linux-rel", 10);
        let service = FakeResultService::default().with_results(
            &build,
            vec![
                unexpected("a", "t2", TestStatus::Fail),
                unexpected("b", "t1", TestStatus::Crash),
                unexpected("a", "t2", TestStatus::Crash),
            ],
        );
        let aggregator = FailureAggregator::new(Arc::new(service));

        let first = aggregator.list_failures(&build).await.unwrap();
        let second = aggregator.list_failures(&build).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(task_ids(&first), vec!["t2", "t1"]);
    }

    #[tokio::test]
    async fn test_build_with_only_expected_failures_is_empty() {
        let build = build_ref(2, "linux-rel", 11);
        let service = FakeResultService::default()
            .with_results(&build, vec![expected("a", "t1", TestStatus::Fail)]);

        let groups = FailureAggregator::new(Arc::new(service))
            .list_failures(&build)
            .await
            .unwrap();
        assert!(groups.is_empty());
    }

    #[tokio::test]
    async fn test_build_with_no_results_is_empty() {
        let build = build_ref(3, "linux-rel", 12);
        let groups = FailureAggregator::new(Arc::new(FakeResultService::default()))
            .list_failures(&build)
            .await
            .unwrap();
        assert!(groups.is_empty());
    }

    #[tokio::test]
    async fn test_service_error_yields_no_listing() {
        let build = build_ref(4, "linux-rel", 13);
        let service = FakeResultService {
            failing_builds: vec![build.id],
            ..Default::default()
        };

        let result = FailureAggregator::new(Arc::new(service)).list_failures(&build).await;
        assert!(matches!(result, Err(TriageError::Service(_))));
    }

    #[tokio::test]
    async fn test_many_builds_keep_input_order() {
        let a = build_ref(10, "linux-rel", 1);
        let b = build_ref(11, "win-rel", 1);
        let c = build_ref(12, "mac-rel", 1);
        let service = FakeResultService::default()
            .with_results(&a, vec![unexpected("a", "ta", TestStatus::Fail)])
            .with_results(&c, vec![unexpected("c", "tc", TestStatus::Crash)]);
        let aggregator = FailureAggregator::new(Arc::new(service));

        let listing = aggregator
            .list_failures_for_builds(&[a.clone(), b.clone(), c.clone()], 2)
            .await
            .unwrap();

        let order: Vec<u64> = listing.iter().map(|(build, _)| build.id.get()).collect();
        assert_eq!(order, vec![10, 11, 12]);
        assert!(listing[1].1.is_empty());
        assert_eq!(listing[2].1[0].task_id.as_str(), "tc");
    }

    #[tokio::test]
    async fn test_many_builds_abort_on_error() {
        let a = build_ref(10, "linux-rel", 1);
        let b = build_ref(11, "win-rel", 1);
        let service = Arc::new(FakeResultService {
            failing_builds: vec![b.id],
            ..Default::default()
        });
        let aggregator = FailureAggregator::new(service.clone());

        let result = aggregator.list_failures_for_builds(&[a, b], 0).await;
        assert!(matches!(result, Err(TriageError::Service(_))));
        assert!(service.calls.load(Ordering::SeqCst) >= 1);
    }
}
