//! revsum - aspect-based product review summarizer
//!
//! A CLI tool that scores annotated product reviews, aggregates what
//! users liked and disliked, and writes a human-readable report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (configuration, I/O, collaborator failure, etc.)
//!   2 - Report degraded (the report model call failed)
//!   3 - No reviews found

mod analysis;
mod cli;
mod collaborators;
mod config;
mod llm;
mod models;
mod pipeline;
mod report;
mod summary;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE};
use pipeline::{PipelineOrchestrator, PipelineSettings, RunOutcome, RunRequest, Services};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

const EXIT_DEGRADED: i32 = 2;
const EXIT_NO_REVIEWS: i32 = 3;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load the config first so its verbose setting reaches the logger
    let loaded = load_config(&args);
    let config_verbose = loaded
        .as_ref()
        .is_ok_and(|(config, _)| config.general.verbose);

    // Initialize logging
    init_logging(args.log_level(config_verbose));

    info!("revsum v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", redacted(&args));

    match run(args, loaded).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .revsum.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set service endpoints, the report model and output paths.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Arguments with the API key masked, for debug logging.
fn redacted(args: &Args) -> Args {
    let mut args = args.clone();
    if args.api_key.is_some() {
        args.api_key = Some("***".to_string());
    }
    args
}

/// Run the pipeline once. Returns the exit code.
async fn run(args: Args, loaded: Result<(Config, ConfigOrigin)>) -> Result<i32> {
    let start_time = Instant::now();

    let (mut config, origin) = loaded?;
    origin.log();
    config.merge_with_args(&args);
    config.validate()?;

    let locator = args
        .reviews
        .as_ref()
        .context("--reviews is required")?
        .display()
        .to_string();

    let services = Services::init(&config).context("Failed to initialize services")?;
    let settings = PipelineSettings {
        max_reviews: config.general.max_reviews,
        min_length: config.summarizer.min_length,
        max_length: config.summarizer.max_length,
        show_progress: !args.quiet && !args.json,
    };
    let request = RunRequest {
        product_id: args.product_id.clone(),
        locator,
        style: config.report.style,
    };

    let orchestrator = PipelineOrchestrator::new(services, settings);
    let outcome = orchestrator.run(&request).await;
    orchestrator.into_services().shutdown();

    let output = match outcome.context("Pipeline failed")? {
        RunOutcome::Completed(output) => output,
        RunOutcome::NoReviews => {
            eprintln!("⚠️  No reviews found in {}", request.locator);
            return Ok(EXIT_NO_REVIEWS);
        }
    };

    if args.json {
        let json =
            serde_json::to_string_pretty(&output).context("Failed to serialize the result")?;
        println!("{}", json);
    } else {
        println!("{}", output.contextual_report);
        if !args.quiet {
            println!("\n📊 Run Summary:");
            println!("   Product: {}", output.product_id);
            println!("   Simple summary: {}", output.simple_summary);
            println!("   Report: {}", output.report_path.display());
            println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
        }
    }

    if output.degraded {
        warn!("The report model call failed; the report carries the error");
        eprintln!("\n⛔ Report degraded: the report model call failed (exit code 2).");
        return Ok(EXIT_DEGRADED);
    }

    Ok(0)
}

/// Where the configuration came from, logged once logging is set up.
enum ConfigOrigin {
    File(PathBuf),
    Defaults,
    Fallback(String),
}

impl ConfigOrigin {
    fn log(&self) {
        match self {
            ConfigOrigin::File(path) => info!("Loaded config from: {}", path.display()),
            ConfigOrigin::Defaults => debug!("No config file found, using defaults"),
            ConfigOrigin::Fallback(reason) => warn!("Failed to load config: {}", reason),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigOrigin::File(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigOrigin::File(PathBuf::from(CONFIG_FILE)))),
        Ok(None) => Ok((Config::default(), ConfigOrigin::Defaults)),
        Err(e) => Ok((Config::default(), ConfigOrigin::Fallback(e.to_string()))),
    }
}
