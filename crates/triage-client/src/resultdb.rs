//! ResultDB binding of the Test Result Service and the Log Service.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use triage_core::{BuildRef, LogService, TaskId, TestResult, TestResultService, TestStatus};

use crate::error::ClientError;
use crate::http::HttpClient;
use crate::paging::collect_pages;
use crate::prpc::PrpcClient;

const SERVICE: &str = "luci.resultdb.v1.ResultDB";

/// Artifacts tried in order before falling back to the first one listed.
const PREFERRED_ARTIFACTS: [&str; 2] = ["test_log", "stdout"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryTestVariantsResponse {
    #[serde(default)]
    test_variants: Vec<WireTestVariant>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTestVariant {
    test_id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<WireResultBundle>,
}

#[derive(Debug, Deserialize)]
struct WireResultBundle {
    result: WireTestResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTestResult {
    name: String,
    #[serde(default)]
    expected: bool,
    #[serde(default)]
    status: TestStatus,
    failure_reason: Option<WireFailureReason>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFailureReason {
    primary_error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListArtifactsResponse {
    #[serde(default)]
    artifacts: Vec<WireArtifact>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireArtifact {
    artifact_id: String,
    fetch_url: String,
}

/// Invocation id and task id encoded in a result name.
///
/// Names look like `invocations/task-<id>/tests/<test>/results/<rid>`.
pub(crate) fn parse_result_name(name: &str) -> Result<(String, TaskId), ClientError> {
    let mut parts = name.split('/');
    match (parts.next(), parts.next()) {
        (Some("invocations"), Some(invocation)) if !invocation.is_empty() => {
            let task = invocation.strip_prefix("task-").unwrap_or(invocation);
            Ok((invocation.to_string(), TaskId::new(task)))
        }
        _ => Err(ClientError::InvalidResponse(format!(
            "malformed result name '{}'",
            name
        ))),
    }
}

/// Variant status ResultDB uses for tests with both passing and failing runs.
const FLAKY_VARIANT: &str = "FLAKY";

/// Flatten variants into per-result records, keeping response order.
fn flatten_variants(variants: Vec<WireTestVariant>) -> Result<Vec<TestResult>, ClientError> {
    let mut results = Vec::new();
    for variant in variants {
        let flaky = variant.status == FLAKY_VARIANT;
        for bundle in variant.results {
            let wire = bundle.result;
            let (invocation_id, task_id) = parse_result_name(&wire.name)?;
            results.push(TestResult {
                test_id: variant.test_id.clone(),
                expected: wire.expected,
                status: wire.status,
                task_id,
                result_name: wire.name,
                invocation_id,
                flaky,
                failure_reason: wire.failure_reason.and_then(|r| r.primary_error_message),
            });
        }
    }
    Ok(results)
}

fn pick_artifact(artifacts: &[WireArtifact]) -> Option<&WireArtifact> {
    PREFERRED_ARTIFACTS
        .iter()
        .find_map(|id| artifacts.iter().find(|a| a.artifact_id == *id))
        .or_else(|| artifacts.first())
}

/// Test results and raw logs over ResultDB pRPC.
pub struct ResultDbClient {
    prpc: PrpcClient,
    http: HttpClient,
    page_size: u32,
}

impl ResultDbClient {
    pub fn new(prpc: PrpcClient, http: HttpClient, page_size: u32) -> Self {
        Self {
            prpc,
            http,
            page_size,
        }
    }

    async fn query_variants(&self, build: &BuildRef) -> Result<Vec<WireTestVariant>, ClientError> {
        let invocation = format!("invocations/build-{}", build.id);
        let variants = collect_pages(|page_token| {
            let invocation = invocation.clone();
            async move {
                let mut request = json!({
                    "invocations": [invocation],
                    "predicate": { "expectancy": "VARIANTS_WITH_UNEXPECTED_RESULTS" },
                    "pageSize": self.page_size,
                });
                if let Some(token) = page_token {
                    request["pageToken"] = json!(token);
                }

                let page: QueryTestVariantsResponse =
                    self.prpc.call(SERVICE, "QueryTestVariants", &request).await?;
                Ok::<_, ClientError>((page.test_variants, page.next_page_token))
            }
        })
        .await?;

        debug!(build_id = %build.id, variants = variants.len(), "QueryTestVariants");
        Ok(variants)
    }

    async fn list_artifacts(&self, result_name: &str) -> Result<Vec<WireArtifact>, ClientError> {
        let request = json!({ "parent": result_name, "pageSize": self.page_size });
        match self.prpc.call::<_, ListArtifactsResponse>(SERVICE, "ListArtifacts", &request).await {
            Ok(response) => Ok(response.artifacts),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl TestResultService for ResultDbClient {
    async fn list_results(&self, build: &BuildRef) -> triage_core::error::Result<Vec<TestResult>> {
        let variants = self.query_variants(build).await?;
        Ok(flatten_variants(variants)?)
    }
}

#[async_trait]
impl LogService for ResultDbClient {
    async fn fetch_raw_log(&self, result_name: &str) -> triage_core::error::Result<Option<String>> {
        let artifacts = self.list_artifacts(result_name).await?;
        let Some(artifact) = pick_artifact(&artifacts) else {
            return Ok(None);
        };

        info!(result_name, artifact = %artifact.artifact_id, "Fetching log artifact");
        Ok(self.http.get_text(&artifact.fetch_url, false).await?)
    }
}
