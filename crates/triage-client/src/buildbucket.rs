//! Buildbucket binding of the Build Service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use triage_core::{
    BuildDetail, BuildId, BuildRecord, BuildRef, BuildService, BuildStatus, BuilderId,
};

use crate::error::ClientError;
use crate::gerrit::GerritClient;
use crate::paging::collect_pages;
use crate::prpc::PrpcClient;
use crate::wire::Int64;

const SERVICE: &str = "buildbucket.v2.Builds";

const IDENTITY_FIELDS: &str = "id,builder,number,status";
const DETAIL_FIELDS: &str = "id,builder,number,status,summaryMarkdown,output.properties";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireBuilder {
    project: String,
    bucket: String,
    builder: String,
}

impl From<&BuilderId> for WireBuilder {
    fn from(b: &BuilderId) -> Self {
        Self {
            project: b.project.clone(),
            bucket: b.bucket.clone(),
            builder: b.builder.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct WireOutput {
    #[serde(default)]
    properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBuild {
    id: Int64,
    builder: WireBuilder,
    #[serde(default)]
    number: u32,
    #[serde(default)]
    status: BuildStatus,
    summary_markdown: Option<String>,
    #[serde(default)]
    output: Option<WireOutput>,
}

impl WireBuild {
    fn build_ref(&self) -> Result<BuildRef, ClientError> {
        if self.id.0 == 0 {
            return Err(ClientError::InvalidResponse("build without id".to_string()));
        }
        let b = &self.builder;
        Ok(BuildRef::new(
            BuildId::new(self.id.0),
            BuilderId::new(&b.project, &b.bucket, &b.builder),
            self.number,
        ))
    }

    fn into_detail(self) -> Result<BuildDetail, ClientError> {
        let build = self.build_ref()?;
        Ok(BuildDetail {
            build,
            status: self.status,
            summary_markdown: self.summary_markdown,
            output_properties: self.output.unwrap_or_default().properties,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchBuildsResponse {
    #[serde(default)]
    builds: Vec<WireBuild>,
    next_page_token: Option<String>,
}

/// Build Service over Buildbucket pRPC, with Gerrit for patchset lookup.
pub struct BuildbucketClient {
    prpc: PrpcClient,
    gerrit: GerritClient,
    page_size: u32,
}

impl BuildbucketClient {
    pub fn new(prpc: PrpcClient, gerrit: GerritClient, page_size: u32) -> Self {
        Self {
            prpc,
            gerrit,
            page_size,
        }
    }

    /// GetBuild, mapping NOT_FOUND to `None`.
    async fn get(&self, request: serde_json::Value) -> Result<Option<WireBuild>, ClientError> {
        match self.prpc.call(SERVICE, "GetBuild", &request).await {
            Ok(build) => Ok(Some(build)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn search(&self, host: &str, change: u64, patchset: u32) -> Result<Vec<WireBuild>, ClientError> {
        collect_pages(|page_token| async move {
            let mut request = json!({
                "predicate": {
                    "gerritChanges": [{
                        "host": host,
                        "change": change,
                        "patchset": patchset,
                    }]
                },
                "mask": { "fields": IDENTITY_FIELDS },
                "pageSize": self.page_size,
            });
            if let Some(token) = page_token {
                request["pageToken"] = json!(token);
            }

            let page: SearchBuildsResponse = self.prpc.call(SERVICE, "SearchBuilds", &request).await?;
            Ok::<_, ClientError>((page.builds, page.next_page_token))
        })
        .await
    }
}

#[async_trait]
impl BuildService for BuildbucketClient {
    async fn find_by_number(
        &self,
        builder: &BuilderId,
        number: u32,
    ) -> triage_core::error::Result<Vec<BuildRef>> {
        let request = json!({
            "builder": WireBuilder::from(builder),
            "buildNumber": number,
            "mask": { "fields": IDENTITY_FIELDS },
        });

        match self.get(request).await? {
            Some(build) => Ok(vec![build.build_ref()?]),
            None => Ok(Vec::new()),
        }
    }

    async fn latest_patchset(&self, host: &str, change: u64) -> triage_core::error::Result<Option<u32>> {
        Ok(self.gerrit.latest_patchset(host, change).await?)
    }

    async fn search_by_change(
        &self,
        host: &str,
        change: u64,
        patchset: u32,
    ) -> triage_core::error::Result<Vec<BuildRecord>> {
        let builds = self.search(host, change, patchset).await?;
        debug!(change, patchset, builds = builds.len(), "SearchBuilds");

        let records = builds
            .iter()
            .map(|b| -> Result<BuildRecord, ClientError> {
                Ok(BuildRecord {
                    build: b.build_ref()?,
                    status: b.status,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    async fn get_build(&self, id: BuildId) -> triage_core::error::Result<Option<BuildDetail>> {
        let request = json!({
            "id": id.to_string(),
            "mask": { "fields": DETAIL_FIELDS },
        });

        match self.get(request).await? {
            Some(build) => Ok(Some(build.into_detail()?)),
            None => Ok(None),
        }
    }
}
