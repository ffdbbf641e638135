//! Binary entry point of `nexus-harness`.
//!
//! Selects an RPC endpoint, builds the mock wallet provider, runs the built-in
//! wallet suite under the global timeout and writes the reports.

use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use clap::Parser;
use mock_provider::{HttpConnector, MockProvider};
use nexus_harness::{
    EventCollector, HarnessConfig, HarnessError, ReportWriter, RunSummary, TestContext, TestEvent,
    TestResult, start_wallet_suite,
};
use tracing::{error, info, warn};

/// Per-request limit of the HTTP client behind the selected endpoint.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser, Debug, Clone)]
#[command(
    name = "nexus-harness",
    version,
    about = "Run wallet provider checks against a live RPC endpoint"
)]
struct Args {
    /// YAML configuration file.
    #[arg(short, long, env = "NEXUS_HARNESS_CONFIG")]
    config: Option<PathBuf>,

    /// Preferred RPC endpoint, tried before the built-in ones.
    #[arg(long, env = "TEST_RPC_URL")]
    rpc_url: Option<String>,

    /// Test name filter (`*` wildcards or substring).
    #[arg(short, long)]
    filter: Option<String>,

    /// Directory for report files.
    #[arg(long, env = "NEXUS_HARNESS_REPORTS_DIR")]
    reports_dir: Option<PathBuf>,

    /// Fail when no endpoint answers instead of using the last candidate.
    #[arg(long)]
    strict_endpoints: bool,

    /// Log level / filter directive.
    #[arg(long, env = "NEXUS_HARNESS_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format: `text` or `json`.
    #[arg(long, env = "NEXUS_HARNESS_LOG_FORMAT", default_value = "text")]
    log_format: String,

    /// Only write the summary report.
    #[arg(long)]
    summary_only: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<HarnessConfig> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => HarnessConfig::default(),
        };
        config = config.with_rpc_override(self.rpc_url);
        if self.filter.is_some() {
            config.filter = self.filter;
        }
        if let Some(dir) = self.reports_dir {
            config.reports_dir = dir;
        }
        config.strict_endpoints |= self.strict_endpoints;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_tracing(&args.log_level, &args.log_format);
    let summary_only = args.summary_only;
    let config = args.into_config()?;

    let connector = HttpConnector::new(REQUEST_TIMEOUT, config.probe_timeout()?)?;
    let policy = config.selection_policy();
    let provider = MockProvider::connect(&config.candidates(), &connector, policy)
        .await
        .context("selecting RPC endpoint")?
        .with_identity(config.identity()?)
        .with_chain_id(config.chain_id);

    info!(
        endpoint = provider.endpoint_url(),
        address = %provider.address(),
        chain_id = provider.chain_id(),
        degraded = provider.is_degraded(),
        network = %config.network,
        "Provider ready"
    );

    let SuiteRun { results, timed_out } = run_suite(&config, provider).await?;

    let writer = ReportWriter::new(&config.reports_dir)?;
    if summary_only {
        writer.write_summary()?;
    } else {
        for path in writer.write_all(&results)? {
            info!(path = %path.display(), "Wrote report");
        }
    }

    let summary = RunSummary::from_results(&results);
    info!(
        passed = summary.passed,
        failed = summary.failed,
        skipped = summary.skipped,
        "Suite finished"
    );
    if let Some(e) = timed_out {
        return Err(anyhow::Error::new(e).context("suite did not finish"));
    }
    if summary.failed > 0 {
        anyhow::bail!("{} of {} tests failed", summary.failed, summary.total());
    }
    Ok(())
}

/// Results of a suite run, possibly cut short.
struct SuiteRun {
    results: Vec<TestResult>,
    /// Set when the global timeout stopped the suite.
    timed_out: Option<HarnessError>,
}

/// Runs the suite until it completes, the global timeout fires or Ctrl-C arrives.
///
/// Results of tests that finished before an interruption are kept. On timeout the
/// test in flight counts as failed; on Ctrl-C it counts as skipped.
async fn run_suite(config: &HarnessConfig, provider: MockProvider) -> anyhow::Result<SuiteRun> {
    let global_timeout = config.global_timeout()?;
    let ctx = TestContext::new(provider);
    let mut handle = start_wallet_suite(ctx, config.filter.clone(), config.test_timeout()?);
    let mut collector = EventCollector::new();

    let mut timed_out = None;
    let mut interrupted = false;
    tokio::select! {
        outcome = handle.collect(&mut collector, global_timeout, log_event) => {
            timed_out = outcome.err();
        }
        _ = tokio::signal::ctrl_c() => {
            interrupted = true;
        }
    }

    if interrupted {
        warn!(running = ?collector.running(), "received SIGINT, stopping suite");
        handle.results.abort();
        collector.skip_running("interrupted by SIGINT");
    }
    if let Some(e) = &timed_out {
        error!(error = %e, "Suite interrupted");
    }

    Ok(SuiteRun { results: collector.into_results(), timed_out })
}

fn log_event(event: &TestEvent) {
    match event {
        TestEvent::TestStarted { category, name } => info!(%category, %name, "Running"),
        TestEvent::TestPassed { category, name, duration } => {
            info!(%category, %name, ?duration, "Passed");
        }
        TestEvent::TestFailed { category, name, duration, error } => {
            error!(%category, %name, ?duration, %error, "Failed");
        }
        TestEvent::TestSkipped { category, name, reason } => {
            warn!(%category, %name, %reason, "Skipped");
        }
        TestEvent::SuiteComplete { .. } => {}
    }
}

fn init_tracing(level: &str, format: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        "json" => {
            tracing_subscriber::fmt().with_env_filter(filter).json().init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}
