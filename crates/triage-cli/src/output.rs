//! Terse output shapes for constrained-context consumers.

use serde::Serialize;

use triage_core::{BuildDetail, BuildRef, BuildStatus, TaskGroup, TestStatus, TriageError};

#[derive(Debug, Serialize)]
pub struct BuildView {
    pub id: String,
    pub builder: String,
    pub number: u32,
}

impl From<&BuildRef> for BuildView {
    fn from(b: &BuildRef) -> Self {
        Self {
            id: b.id.to_string(),
            builder: b.builder.to_string(),
            number: b.number,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DetailView<'a> {
    #[serde(flatten)]
    pub build: BuildView,
    pub status: BuildStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<&'a str>,
    pub properties: &'a serde_json::Map<String, serde_json::Value>,
}

impl<'a> From<&'a BuildDetail> for DetailView<'a> {
    fn from(d: &'a BuildDetail) -> Self {
        Self {
            build: BuildView::from(&d.build),
            status: d.status,
            summary: d.summary_markdown.as_deref(),
            properties: &d.output_properties,
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct FailureView {
    pub test_id: String,
    pub status: TestStatus,
    pub res: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub root: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub flaky: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct GroupView {
    pub task: String,
    pub failures: Vec<FailureView>,
}

#[derive(Debug, Serialize)]
pub struct BuildFailuresView {
    pub build: BuildView,
    pub tasks: Vec<GroupView>,
    #[serde(skip_serializing_if = "is_zero")]
    pub omitted: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// Render groups, keeping at most `limit` entries in triage order.
///
/// Returns the views and the number of entries left out.
pub fn limit_groups(groups: &[TaskGroup], limit: usize) -> (Vec<GroupView>, usize) {
    let mut remaining = limit;
    let mut omitted = 0;
    let mut views = Vec::new();

    for group in groups {
        let take = group.len().min(remaining);
        omitted += group.len() - take;
        remaining -= take;
        if take == 0 {
            continue;
        }

        views.push(GroupView {
            task: group.task_id.to_string(),
            failures: group
                .entries
                .iter()
                .take(take)
                .map(|e| FailureView {
                    test_id: e.result.test_id.clone(),
                    status: e.result.status,
                    res: e.result.result_name.clone(),
                    root: e.root_failure,
                    flaky: e.result.flaky,
                    err: e.result.failure_reason.clone(),
                })
                .collect(),
        });
    }

    (views, omitted)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), TriageError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| TriageError::Service(format!("encoding output: {}", e)))?;
    println!("{}", text);
    Ok(())
}
