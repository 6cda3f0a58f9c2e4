//! Spiread Smoke - command-line runner for the Spiread smoke suites.
//!
//! Prints the human summary on stdout and logs on stderr. The exit code
//! reflects the run: 0 success, 1 failures, 2 interrupted, 3 fatal error.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use spiread_smoke::config::{NetworkConfig, PerformanceConfig, ReleaseConfig};
use spiread_smoke::{
    render_run, CancellationToken, ExitCode, Runner, SmokeConfig, SuiteId, UserIdStrategy,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "spiread-smoke")]
#[command(about = "Black-box smoke suites for the Spiread web API")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one or more suites (core-ux when none given)
    Run(RunArgs),
    /// List the available suites
    List,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Suites to run, in order
    #[arg(value_enum)]
    suites: Vec<SuiteId>,

    /// Run every suite
    #[arg(long, conflicts_with = "suites")]
    all: bool,

    /// Deployment base URL
    #[arg(
        long,
        env = "SPIREAD_BASE_URL",
        default_value = NetworkConfig::DEFAULT_BASE_URL
    )]
    base_url: String,

    /// Path prefix of the API routes
    #[arg(long, default_value = NetworkConfig::API_PREFIX)]
    api_prefix: String,

    /// Per-request timeout in seconds
    #[arg(
        long,
        env = "SPIREAD_TIMEOUT",
        default_value_t = NetworkConfig::REQUEST_TIMEOUT.as_secs()
    )]
    timeout: u64,

    /// Fixed test user id (random UUID when omitted)
    #[arg(long, env = "SPIREAD_USER_ID")]
    user_id: Option<String>,

    /// Pause between Par/Impar checks in milliseconds
    #[arg(
        long,
        default_value_t = PerformanceConfig::PAUSE_BETWEEN_CHECKS.as_millis() as u64
    )]
    pause_ms: u64,

    /// Release version the go/no-go object must report
    #[arg(long, default_value = ReleaseConfig::EXPECTED_VERSION)]
    expected_version: String,

    /// Write the detailed JSON report to this file
    #[arg(long, env = "SPIREAD_OUTPUT")]
    output: Option<PathBuf>,
}

impl RunArgs {
    fn selected(&self) -> Vec<SuiteId> {
        if self.all {
            SuiteId::ALL.to_vec()
        } else if self.suites.is_empty() {
            vec![SuiteId::CoreUx]
        } else {
            self.suites.clone()
        }
    }

    fn config(&self) -> spiread_smoke::Result<SmokeConfig> {
        let user_id = match &self.user_id {
            Some(id) => UserIdStrategy::Fixed(id.clone()),
            None => UserIdStrategy::Random,
        };
        SmokeConfig::builder(self.base_url.as_str())
            .api_prefix(self.api_prefix.as_str())
            .timeout(Duration::from_secs(self.timeout))
            .user_id(user_id)
            .pause_between_checks(Duration::from_millis(self.pause_ms))
            .expected_version(self.expected_version.as_str())
            .output(self.output.clone())
            .build()
    }
}

fn init_logging(debug: bool, json: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

fn list_suites() {
    for id in SuiteId::ALL {
        let help = id
            .to_possible_value()
            .and_then(|value| value.get_help().map(ToString::to_string))
            .unwrap_or_default();
        println!("{:<14} {}", id.as_str(), help);
    }
}

async fn run(args: RunArgs) -> Result<i32> {
    let config = args.config().context("Invalid configuration")?;
    let output = config.output.clone();
    let suites = args.selected();

    let runner = Runner::new(config).context("Failed to set up the runner")?;
    info!("Test User ID: {}", runner.user_id());

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current check");
            token.cancel();
        }
    });

    let report = runner.run(&suites, cancel).await;
    println!("{}", render_run(&report));

    if let Some(path) = output {
        report
            .write_json(&path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    Ok(report.exit_code())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug, cli.json_logs);

    let code = match cli.command {
        Command::List => {
            list_suites();
            ExitCode::SUCCESS
        }
        Command::Run(args) => match run(args).await {
            Ok(code) => code,
            Err(e) => {
                error!("💥 Testing failed with error: {:#}", e);
                ExitCode::FATAL
            }
        },
    };

    std::process::exit(code);
}
