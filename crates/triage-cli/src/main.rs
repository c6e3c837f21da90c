//! CI Triage CLI - resolve builds, list unexpected failures, fetch log excerpts.

use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use triage_client::Services;
use triage_core::aggregator::DEFAULT_CONCURRENCY;
use triage_core::{
    BuildDetailFetcher, BuildId, BuildRef, BuilderId, FailureAggregator, IdentityResolver,
    LogFilter, TriageError,
};

mod config;
mod output;

use config::GlobalArgs;
use output::{limit_groups, print_json, BuildFailuresView, BuildView, DetailView};

/// CI Triage - compact views of failing builds and tests
#[derive(Debug, Parser)]
#[command(name = "ci-triage", version)]
#[command(about = "Triage CI build and test failures", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Builds named by id, or one build by builder and number.
#[derive(Debug, clap::Args)]
struct BuildSelector {
    /// Build id (the `b` prefix from build URLs is accepted); repeatable
    #[arg(
        long = "build-id",
        value_name = "BUILD_ID",
        action = ArgAction::Append,
        conflicts_with_all = ["builder", "build_number"]
    )]
    build_id: Vec<String>,

    /// LUCI project
    #[arg(long, default_value = "chromium")]
    project: String,

    /// Bucket
    #[arg(long, default_value = "ci")]
    bucket: String,

    /// Builder name
    #[arg(long, requires = "build_number")]
    builder: Option<String>,

    /// Build number
    #[arg(long, requires = "builder")]
    build_number: Option<u32>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the build id for a builder and build number
    #[command(name = "resolve-build-id")]
    ResolveBuildId {
        /// LUCI project
        #[arg(long, default_value = "chromium")]
        project: String,

        /// Bucket
        #[arg(long, default_value = "ci")]
        bucket: String,

        /// Builder name
        #[arg(long)]
        builder: String,

        /// Build number
        #[arg(long)]
        build_number: u32,
    },

    /// List failed builds of a changelist
    #[command(name = "find-cl-builds")]
    FindClBuilds {
        /// Change number
        #[arg(long)]
        cl: u64,

        /// Patchset (defaults to the latest)
        #[arg(long)]
        patchset: Option<u32>,

        /// Code review host (defaults to --gerrit-host)
        #[arg(long)]
        host: Option<String>,

        /// Also list unexpected failures of every failed build
        #[arg(long)]
        with_failures: bool,

        /// Maximum failures printed per build
        #[arg(long, default_value_t = 500)]
        limit: usize,

        /// Builds listed concurrently
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },

    /// Show status, summary, and output properties of a build
    #[command(name = "get-build")]
    GetBuild {
        #[command(flatten)]
        selector: BuildSelector,
    },

    /// List unexpected test failures grouped by task
    #[command(name = "list-failures")]
    ListFailures {
        #[command(flatten)]
        selector: BuildSelector,

        /// Maximum failures printed per build
        #[arg(long, default_value_t = 500)]
        limit: usize,

        /// Builds listed concurrently
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },

    /// Print failure-signal lines from a test result's log
    #[command(name = "fetch-log")]
    FetchLog {
        /// Result name (invocations/.../results/...)
        #[arg(long)]
        res: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(usage_exit_code(&e));
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.global.log_directive())),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

/// Exit status for a command line clap refused to parse.
///
/// Help and version requests are not failures; everything else is a usage
/// error and shares the `Argument` exit code.
fn usage_exit_code(e: &clap::Error) -> u8 {
    if e.use_stderr() {
        TriageError::Argument(e.to_string()).exit_code() as u8
    } else {
        0
    }
}

/// Components bound to the live services.
struct App {
    resolver: IdentityResolver,
    aggregator: FailureAggregator,
    log_filter: LogFilter,
    details: BuildDetailFetcher,
    gerrit_host: String,
}

impl App {
    fn connect(global: &GlobalArgs) -> Result<Self, TriageError> {
        let config = global.client_config();
        debug!(
            buildbucket = %config.buildbucket_host,
            resultdb = %config.resultdb_host,
            "Connecting services"
        );
        let services = Services::connect(&config)?;

        Ok(Self {
            resolver: IdentityResolver::new(services.builds.clone()),
            aggregator: FailureAggregator::new(services.results.clone()),
            log_filter: LogFilter::new(services.results),
            details: BuildDetailFetcher::new(services.builds),
            gerrit_host: config.gerrit_host,
        })
    }

    /// Resolve every build the selector names, in command-line order.
    async fn select(&self, selector: &BuildSelector) -> Result<Vec<BuildRef>, TriageError> {
        match (selector.build_id.as_slice(), &selector.builder, selector.build_number) {
            ([], Some(builder), Some(number)) => {
                let builder = BuilderId::new(&selector.project, &selector.bucket, builder);
                Ok(vec![self.resolver.resolve_by_builder(&builder, number).await?])
            }
            ([], _, _) => Err(TriageError::Argument(
                "either --build-id or --builder with --build-number is required".to_string(),
            )),
            (ids, _, _) => {
                let mut builds = Vec::with_capacity(ids.len());
                for id in ids {
                    builds.push(self.resolver.resolve_by_id(id.parse()?).await?);
                }
                Ok(builds)
            }
        }
    }

    async fn print_failures(
        &self,
        builds: &[BuildRef],
        limit: usize,
        concurrency: usize,
    ) -> Result<(), TriageError> {
        let listing = self
            .aggregator
            .list_failures_for_builds(builds, concurrency)
            .await?;

        let views: Vec<BuildFailuresView> = listing
            .iter()
            .map(|(build, groups)| {
                let (tasks, omitted) = limit_groups(groups, limit);
                BuildFailuresView {
                    build: BuildView::from(build),
                    tasks,
                    omitted,
                }
            })
            .collect();

        print_json(&views)
    }
}

async fn run(cli: Cli) -> Result<(), TriageError> {
    let app = App::connect(&cli.global)?;

    match cli.command {
        Commands::ResolveBuildId {
            project,
            bucket,
            builder,
            build_number,
        } => {
            let builder = BuilderId::new(project, bucket, builder);
            let build = app.resolver.resolve_by_builder(&builder, build_number).await?;
            println!("{}", build.id);
        }
        Commands::FindClBuilds {
            cl,
            patchset,
            host,
            with_failures,
            limit,
            concurrency,
        } => {
            let host = host.unwrap_or_else(|| app.gerrit_host.clone());
            let builds = app.resolver.resolve_by_change(&host, cl, patchset).await?;
            if with_failures {
                app.print_failures(&builds, limit, concurrency).await?;
            } else {
                let views: Vec<BuildView> = builds.iter().map(BuildView::from).collect();
                print_json(&views)?;
            }
        }
        Commands::GetBuild { selector } => {
            let detail = match selector.build_id.as_slice() {
                [id] => app.details.get_build_by_id(id.parse::<BuildId>()?).await?,
                [] => {
                    let builds = app.select(&selector).await?;
                    app.details.get_build(&builds[0]).await?
                }
                _ => {
                    return Err(TriageError::Argument(
                        "get-build takes a single --build-id".to_string(),
                    ))
                }
            };
            print_json(&DetailView::from(&detail))?;
        }
        Commands::ListFailures {
            selector,
            limit,
            concurrency,
        } => {
            let builds = app.select(&selector).await?;
            app.print_failures(&builds, limit, concurrency).await?;
        }
        Commands::FetchLog { res } => {
            let snippet = app.log_filter.fetch_log(&res).await?;
            if snippet.is_empty() {
                eprintln!("no failure-signal lines matched; fetch the full log to inspect");
            }
            for line in &snippet.lines {
                println!("{}", line);
            }
        }
    }

    Ok(())
}
