//! FeedbackDesk - customer feedback submission and reporting
//!
//! A CLI client for the feedback service: submits branch feedback tied to a
//! customer's mobile number, and builds filtered dashboards and CSV exports
//! from everything submitted.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (invalid link, fetch/submit failure, config, I/O)

mod analysis;
mod cli;
mod client;
mod config;
mod error;
mod models;
mod report;
mod session;
mod submission;

use anyhow::{Context, Result};
use chrono::Local;
use cli::{Args, Command, ExportArgs, OutputFormat, ReportArgs, SubmitArgs};
use client::FeedbackClient;
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use session::ReportSession;
use std::path::Path;
use std::time::Duration;
use submission::{FormAnswers, RouteParams, SubmissionWorkflow};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

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

    // Load configuration before logging so config can turn on verbose output
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config);

    info!("FeedbackDesk v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args, config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .feedbackdesk.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to point at your feedback service and tune report defaults.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Ignoring unreadable {}: {:#}", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}

async fn run(args: Args, config: Config) -> Result<()> {
    let client = FeedbackClient::new(&config.service)?;
    info!("Feedback service: {}", client.base_url());

    match args.command {
        Some(Command::Submit(ref submit_args)) => run_submit(submit_args, &client, args.quiet).await,
        Some(Command::Report(ref report_args)) => run_report(report_args, client, &config, args.quiet).await,
        Some(Command::Export(ref export_args)) => run_export(export_args, client, &config, args.quiet).await,
        None => Ok(()),
    }
}

/// Spinner shown while waiting on the feedback service.
fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Validate the link, then run the one-shot submit workflow.
async fn run_submit(args: &SubmitArgs, client: &FeedbackClient, quiet: bool) -> Result<()> {
    let route = RouteParams::parse(&args.mobile, &args.branch)?;

    let answers = FormAnswers {
        ratings: [args.overall, args.service, args.staff, args.collection],
        recommend: args.recommend.clone(),
        discovery: args.discovery.clone(),
        comment: args.comment.clone(),
        daily_rate_message: args.daily_rate_message.clone(),
    };
    let form = answers.into_submission(&route)?;

    if !quiet {
        let prompt = match client.current_event().await {
            Some(event) => format!("How did you know about {}?", event),
            None => "How did you know about the event?".to_string(),
        };
        let methods = if form.discovery_methods.is_empty() {
            "-".to_string()
        } else {
            form.discovery_methods
                .iter()
                .map(|m| m.label())
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!("📝 Feedback for branch {} ({})", route.branch, route.mobile_no);
        println!(
            "   Overall: {} | Service: {} | Staff: {} | Collection: {}",
            form.overall, form.service, form.staff, form.collection
        );
        println!("   Would recommend: {}", form.recommend);
        println!("   {} {}", prompt, methods);
    }

    let mut workflow = SubmissionWorkflow::new(route, form);
    let pb = spinner("Submitting feedback...", quiet);
    let result = workflow.submit(client).await;
    pb.finish_and_clear();

    match result {
        Ok(confirmation) => {
            println!("\n✅ {}", confirmation.message());
            Ok(())
        }
        Err(e) => {
            debug!("Submission state: {:?}", workflow.state());
            if let Some(form) = workflow.form() {
                debug!("Unsent form kept for correction: {:?}", form);
            }
            if let Some(message) = workflow.error() {
                eprintln!("⚠️  {}", message);
                eprintln!("   Nothing was recorded; run the same command again to retry.");
            }
            Err(e.into())
        }
    }
}

async fn fetch_snapshot(session: &mut ReportSession, quiet: bool) -> Result<usize> {
    let pb = spinner("Fetching feedback...", quiet);
    let result = session.refresh().await;
    pb.finish_and_clear();
    Ok(result?)
}

fn render_report(session: &ReportSession, args: &ReportArgs, config: &Config) -> Result<String> {
    let now = Local::now();
    let criteria = args.filters.criteria(config.report.bounded_ranges);
    let view = session.view(&criteria, &now);
    debug!(
        "Report view: {} of {} records after filters",
        view.filtered.len(),
        view.total_records
    );

    let format = args
        .format
        .unwrap_or_else(|| OutputFormat::from_config(&config.report.format));
    match format {
        OutputFormat::Json => report::generate_json_report(&view),
        OutputFormat::Markdown => {
            let options = report::RenderOptions {
                recent_rows: config.report.recent_rows,
            };
            Ok(report::generate_markdown_report(&view, &Local, &options))
        }
    }
}

fn emit_report(output: &str, args: &ReportArgs, config: &Config) -> Result<()> {
    let path = args
        .output
        .clone()
        .or_else(|| config.report.output.as_ref().map(Into::into));

    match path {
        Some(path) => {
            std::fs::write(&path, output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report saved to {}", path.display());
        }
        None => println!("{}", output),
    }
    Ok(())
}

async fn run_report(args: &ReportArgs, client: FeedbackClient, config: &Config, quiet: bool) -> Result<()> {
    let mut session = ReportSession::new(client);

    let Some(interval_secs) = args.watch else {
        fetch_snapshot(&mut session, quiet).await?;
        let output = render_report(&session, args, config)?;
        return emit_report(&output, args, config);
    };

    info!("Refreshing every {}s, press Ctrl-C to stop", interval_secs);
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping report refresh");
                return Ok(());
            }
        }

        // A failed refresh keeps the previous snapshot on screen.
        let previous = session.snapshot();
        match fetch_snapshot(&mut session, quiet).await {
            Ok(count) if count > previous.len() => {
                info!("{} new feedback entries", count - previous.len())
            }
            Ok(_) => {}
            Err(e) => {
                warn!("{:#}", e);
                continue;
            }
        }
        let output = render_report(&session, args, config)?;
        emit_report(&output, args, config)?;
    }
}

async fn run_export(args: &ExportArgs, client: FeedbackClient, config: &Config, quiet: bool) -> Result<()> {
    let mut session = ReportSession::new(client);
    fetch_snapshot(&mut session, quiet).await?;

    let now = Local::now();
    let criteria = args.filters.criteria(config.report.bounded_ranges);
    let view = session.view(&criteria, &now);

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| report::default_export_name(&now));
    report::write_csv(&view.filtered, &Local, &path)?;

    println!(
        "✅ Exported {} of {} records to {}",
        view.filtered.len(),
        view.total_records,
        path.display()
    );
    Ok(())
}
