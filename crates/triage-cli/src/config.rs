//! CLI configuration: global flags layered over client defaults.

use clap::Args;
use triage_client::ClientConfig;

/// Service endpoints and transport settings.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Buildbucket pRPC host
    #[arg(long, global = true, env = "CI_TRIAGE_BUILDBUCKET_HOST")]
    pub buildbucket_host: Option<String>,

    /// ResultDB pRPC host
    #[arg(long, global = true, env = "CI_TRIAGE_RESULTDB_HOST")]
    pub resultdb_host: Option<String>,

    /// Default code review host
    #[arg(long, global = true, env = "CI_TRIAGE_GERRIT_HOST")]
    pub gerrit_host: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "CI_TRIAGE_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Page size for paginated queries
    #[arg(long, global = true, env = "CI_TRIAGE_PAGE_SIZE")]
    pub page_size: Option<u32>,

    /// OAuth access token sent with every service request
    #[arg(long, global = true, env = "CI_TRIAGE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl GlobalArgs {
    /// Client configuration with flags applied over the defaults.
    pub fn client_config(&self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            buildbucket_host: self
                .buildbucket_host
                .clone()
                .unwrap_or(defaults.buildbucket_host),
            resultdb_host: self.resultdb_host.clone().unwrap_or(defaults.resultdb_host),
            gerrit_host: self.gerrit_host.clone().unwrap_or(defaults.gerrit_host),
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
            page_size: self.page_size.unwrap_or(defaults.page_size).max(1),
            access_token: self.access_token.clone().or(defaults.access_token),
        }
    }

    /// Default log directive for the verbosity level.
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "triage_cli=warn,triage_client=warn,triage_core=warn",
            1 => "triage_cli=info,triage_client=info,triage_core=info",
            _ => "triage_cli=debug,triage_client=debug,triage_core=debug",
        }
    }
}
