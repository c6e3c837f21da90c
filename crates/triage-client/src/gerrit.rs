//! Gerrit REST binding: latest patchset of a change.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use crate::error::ClientError;
use crate::http::{base_url, HttpClient};

#[derive(Debug, Deserialize)]
struct ChangeInfo {
    current_revision: Option<String>,
    #[serde(default)]
    revisions: HashMap<String, RevisionInfo>,
}

#[derive(Debug, Deserialize)]
struct RevisionInfo {
    #[serde(rename = "_number")]
    number: u32,
}

/// Code review client.
#[derive(Clone)]
pub struct GerritClient {
    http: HttpClient,
}

impl GerritClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Current patchset number of `change` on `host`; `None` if the change
    /// does not exist.
    pub async fn latest_patchset(&self, host: &str, change: u64) -> Result<Option<u32>, ClientError> {
        let url = format!("{}/changes/{}?o=CURRENT_REVISION", base_url(host), change);
        let Some(info) = self.http.get_json::<ChangeInfo>(&url).await? else {
            return Ok(None);
        };

        let patchset = current_patchset(&info)?;
        debug!(change, patchset, "Resolved latest patchset");
        Ok(Some(patchset))
    }
}

fn current_patchset(info: &ChangeInfo) -> Result<u32, ClientError> {
    let revision = info
        .current_revision
        .as_deref()
        .ok_or_else(|| ClientError::InvalidResponse("change has no current_revision".to_string()))?;

    info.revisions
        .get(revision)
        .map(|r| r.number)
        .ok_or_else(|| {
            ClientError::InvalidResponse(format!("current revision {} not in revisions", revision))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::parse_json;

    #[test]
    fn test_current_patchset() {
        let body = r#")]}'
{
  "_number": 12345,
  "current_revision": "9f1c2e",
  "revisions": {
    "9f1c2e": {"kind": "REWORK", "_number": 4}
  }
}"#;
        let info: ChangeInfo = parse_json(body).unwrap();
        assert_eq!(current_patchset(&info).unwrap(), 4);
    }

    #[test]
    fn test_missing_current_revision() {
        let info: ChangeInfo = parse_json(r#"{"_number": 1}"#).unwrap();
        assert!(matches!(
            current_patchset(&info),
            Err(ClientError::InvalidResponse(_))
        ));
    }
}
