//! Service endpoint configuration.

/// Endpoints and transport settings for the service bindings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Build Service (Buildbucket) pRPC host.
    pub buildbucket_host: String,

    /// Test Result Service (ResultDB) pRPC host.
    pub resultdb_host: String,

    /// Default code review (Gerrit) host.
    pub gerrit_host: String,

    /// Per-request timeout (seconds).
    pub timeout_secs: u64,

    /// Page size for paginated queries.
    pub page_size: u32,

    /// OAuth access token sent as a bearer credential, if any.
    pub access_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            buildbucket_host: "cr-buildbucket.appspot.com".to_string(),
            resultdb_host: "results.api.luci.app".to_string(),
            gerrit_host: "chromium-review.googlesource.com".to_string(),
            timeout_secs: 60,
            page_size: 1000,
            access_token: None,
        }
    }
}
