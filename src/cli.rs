//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::FilterCriteria;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// FeedbackDesk - customer feedback submission and reporting
///
/// Records branch feedback against a customer's mobile number and builds
/// filtered dashboards and CSV exports from everything submitted.
///
/// Examples:
///   feedbackdesk submit 9876543210 BR01 --overall 5 --service 4 --staff 5 --collection 4 --recommend yes
///   feedbackdesk report --branch BR01 --range last7days
///   feedbackdesk report --search "late delivery" --format json --output report.json
///   feedbackdesk export --range thisMonth
///   feedbackdesk --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Base URL of the feedback service
    #[arg(long, value_name = "URL", env = "FEEDBACKDESK_URL", global = true)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .feedbackdesk.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .feedbackdesk.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Submit feedback for a customer visit
    Submit(SubmitArgs),
    /// Fetch all feedback and render a dashboard
    Report(ReportArgs),
    /// Fetch all feedback and export the filtered rows as CSV
    Export(ExportArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SubmitArgs {
    /// Customer mobile number (10 digits)
    #[arg(value_name = "MOBILE")]
    pub mobile: String,

    /// Branch code
    #[arg(value_name = "BRANCH")]
    pub branch: String,

    /// Overall experience (0-5, 0 = not rated)
    #[arg(long, default_value = "0")]
    pub overall: u8,

    /// Customer service (0-5)
    #[arg(long, default_value = "0")]
    pub service: u8,

    /// Staff behavior (0-5)
    #[arg(long, default_value = "0")]
    pub staff: u8,

    /// Collection (0-5)
    #[arg(long, default_value = "0")]
    pub collection: u8,

    /// Would recommend to others (yes/no)
    #[arg(long, value_name = "YES|NO")]
    pub recommend: Option<String>,

    /// How the customer heard about the event (comma-separated)
    ///
    /// Known values: Television, Mass Media, Social Media, Notice, News Paper, Invites
    #[arg(long, value_name = "METHODS", value_delimiter = ',')]
    pub discovery: Vec<String>,

    /// Additional comments
    #[arg(long, value_name = "TEXT")]
    pub comment: Option<String>,

    /// Daily rate message
    #[arg(long, value_name = "TEXT")]
    pub daily_rate_message: Option<String>,
}

/// Filters shared by `report` and `export`.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only include this branch ("all" for every branch)
    #[arg(long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Date range: all, today, yesterday, last7days, last30days, thisMonth, lastMonth
    #[arg(long, value_name = "RANGE")]
    pub range: Option<String>,

    /// Case-insensitive text matched against mobile, branch and comments
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,

    /// End "yesterday" and "lastMonth" at the close of that day/month
    #[arg(long)]
    pub bounded: bool,
}

impl FilterArgs {
    /// Build filter criteria, letting the config turn on bounded ranges.
    pub fn criteria(&self, bounded_by_default: bool) -> FilterCriteria {
        FilterCriteria::new(
            self.branch.as_deref(),
            self.range.as_deref(),
            self.search.as_deref(),
        )
        .with_bounded(self.bounded || bounded_by_default)
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the dashboard to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Re-fetch and re-render every N seconds until interrupted
    #[arg(long, value_name = "SECS")]
    pub watch: Option<u64>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// CSV file path (default: feedback_report_<date>.csv)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Output format for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Parse the format named in the config file, defaulting to Markdown.
    pub fn from_config(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Markdown,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.command.is_none() {
            return Err("A command is required: submit, report or export".to_string());
        }

        if let Some(ref url) = self.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Base URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(Command::Report(ref report)) = self.command {
            if report.watch == Some(0) {
                return Err("Watch interval must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
