//! Dashboard rendering.
//!
//! This module renders a [`ReportView`] as a Markdown dashboard or as JSON.

use crate::analysis::ALL_BRANCHES;
use crate::models::{AverageRatings, DerivedMetrics, FeedbackRecord, MAX_RATING};
use crate::session::ReportView;
use anyhow::Result;
use chrono::TimeZone;

/// Options controlling the Markdown dashboard.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Maximum rows in the feedback table.
    pub recent_rows: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { recent_rows: 50 }
    }
}

/// Generate the complete Markdown dashboard.
pub fn generate_markdown_report<Tz: TimeZone>(
    view: &ReportView,
    tz: &Tz,
    options: &RenderOptions,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut output = String::new();

    output.push_str("# Customer Feedback Report\n\n");
    output.push_str(&generate_filters_section(view, tz));
    output.push_str(&generate_summary_section(view.metrics.as_ref()));
    output.push_str(&generate_chart_section(view));
    output.push_str(&generate_timeline_section(view));
    output.push_str(&generate_discovery_section(view));
    output.push_str(&generate_branch_section(view.metrics.as_ref()));
    output.push_str(&generate_feedback_table(view, tz, options.recent_rows));

    output
}

fn generate_filters_section<Tz: TimeZone>(view: &ReportView, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut section = String::new();
    let criteria = &view.criteria;

    section.push_str("## Filters\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        view.generated_at.with_timezone(tz).format("%Y-%m-%d %H:%M")
    ));
    let branch = if criteria.branch == ALL_BRANCHES {
        "All branches"
    } else {
        criteria.branch.as_str()
    };
    section.push_str(&format!("- **Branch:** {}\n", branch));
    section.push_str(&format!(
        "- **Date Range:** {}{}\n",
        criteria.date_range,
        if criteria.bounded { " (bounded)" } else { "" }
    ));
    if !criteria.search.is_empty() {
        section.push_str(&format!("- **Search:** \"{}\"\n", criteria.search));
    }
    section.push('\n');

    section
}

fn generate_summary_section(metrics: Option<&DerivedMetrics>) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");

    let Some(metrics) = metrics else {
        section.push_str("No feedback data found matching your criteria.\n\n");
        return section;
    };

    section.push_str("| Responses | Overall | Service | Staff | Collection | Recommend |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    let r = &metrics.average_ratings;
    section.push_str(&format!(
        "| {} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2}% |\n\n",
        metrics.total_responses, r.overall, r.service, r.staff, r.collection, metrics.recommendation_rate
    ));

    section
}

fn ratings_row(label: &str, ratings: &AverageRatings) -> String {
    format!(
        "| {} | {:.2} | {:.2} | {:.2} | {:.2} |\n",
        label, ratings.overall, ratings.service, ratings.staff, ratings.collection
    )
}

fn generate_chart_section(view: &ReportView) -> String {
    if view.chart_series.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Ratings by Branch\n\n");
    section.push_str("*All feedback, regardless of filters.*\n\n");
    section.push_str("| Branch | Overall | Service | Staff | Collection |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|\n");
    for point in &view.chart_series {
        section.push_str(&ratings_row(&point.branch, &point.ratings));
    }
    section.push('\n');

    section
}

fn generate_timeline_section(view: &ReportView) -> String {
    if view.timeline.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Daily Responses\n\n");
    section.push_str("| Date | Responses | Avg Rating |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for bucket in &view.timeline {
        section.push_str(&format!(
            "| {} | {} | {:.2} |\n",
            bucket.date, bucket.count, bucket.average_rating
        ));
    }
    section.push('\n');

    section
}

fn generate_discovery_section(view: &ReportView) -> String {
    if view.discovery.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Discovery Methods\n\n");
    section.push_str("| Method | Count | Share |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for share in &view.discovery {
        section.push_str(&format!(
            "| {} | {} | {:.1}% |\n",
            share.method, share.count, share.percent
        ));
    }
    section.push('\n');

    section
}

fn generate_branch_section(metrics: Option<&DerivedMetrics>) -> String {
    let Some(metrics) = metrics else {
        return String::new();
    };
    if metrics.branch_performance.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Branch Performance\n\n");
    section.push_str("| Branch | Feedback | Avg Rating | Would Recommend |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");

    let mut branches: Vec<_> = metrics.branch_performance.iter().collect();
    branches.sort_by_key(|(_, perf)| std::cmp::Reverse(perf.total));
    for (branch, perf) in branches {
        section.push_str(&format!(
            "| {} | {} | {:.1}/{} | {:.1}% |\n",
            branch, perf.total, perf.average, MAX_RATING, perf.recommendation
        ));
    }
    section.push('\n');

    section
}

fn stars(rating: u8) -> String {
    let filled = rating.min(MAX_RATING) as usize;
    format!(
        "{}{}",
        "★".repeat(filled),
        "☆".repeat(MAX_RATING as usize - filled)
    )
}

/// Escape characters that would break a Markdown table cell.
fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn feedback_row<Tz: TimeZone>(record: &FeedbackRecord, tz: &Tz) -> String {
    format!(
        "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
        record.day_in(tz),
        table_cell(&record.mobile_no),
        table_cell(&record.branch),
        stars(record.overall.get()),
        stars(record.service.get()),
        stars(record.staff.get()),
        stars(record.collection.get()),
        record.recommend,
        if record.discovery_methods.is_empty() {
            "-".to_string()
        } else {
            table_cell(&record.discovery_label(", "))
        },
        record
            .comment
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .map(table_cell)
            .unwrap_or_else(|| "-".to_string()),
    )
}

fn generate_feedback_table<Tz: TimeZone>(view: &ReportView, tz: &Tz, limit: usize) -> String {
    let mut section = String::new();

    section.push_str("## Feedback\n\n");

    if view.filtered.is_empty() {
        section.push_str("No feedback data found matching your criteria.\n\n");
    } else {
        section.push_str(
            "| Date | Mobile | Branch | Overall | Service | Staff | Collection | Recommend | Discovery | Comments |\n",
        );
        section.push_str("|:---|:---|:---|:---|:---|:---|:---|:---:|:---|:---|\n");
        for record in view.filtered.iter().take(limit) {
            section.push_str(&feedback_row(record, tz));
        }
        section.push('\n');
    }

    section.push_str(&format!(
        "*Showing {} of {} total entries*\n",
        view.filtered.len().min(limit),
        view.total_records
    ));

    section
}

/// Generate the JSON form of the dashboard.
pub fn generate_json_report(view: &ReportView) -> Result<String> {
    serde_json::to_string_pretty(view).map_err(Into::into)
}
