//! Service bindings for CI triage.
//!
//! Provides the Build Service over Buildbucket (with Gerrit for patchset
//! lookup), and the Test Result and Log Services over ResultDB. All speak
//! JSON over HTTP.

pub mod buildbucket;
pub mod config;
pub mod error;
pub mod gerrit;
pub mod http;
mod paging;
pub mod prpc;
pub mod resultdb;
mod wire;

use std::sync::Arc;

pub use buildbucket::BuildbucketClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use gerrit::GerritClient;
pub use http::HttpClient;
pub use prpc::PrpcClient;
pub use resultdb::ResultDbClient;

/// The three service boundaries, bound to one configuration.
pub struct Services {
    pub builds: Arc<BuildbucketClient>,
    pub results: Arc<ResultDbClient>,
}

impl Services {
    /// Build clients for every service. No request is sent.
    pub fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = HttpClient::new(config)?;

        let builds = BuildbucketClient::new(
            PrpcClient::new(http.clone(), &config.buildbucket_host),
            GerritClient::new(http.clone()),
            config.page_size,
        );
        let results = ResultDbClient::new(
            PrpcClient::new(http.clone(), &config.resultdb_host),
            http,
            config.page_size,
        );

        Ok(Self {
            builds: Arc::new(builds),
            results: Arc::new(results),
        })
    }
}
