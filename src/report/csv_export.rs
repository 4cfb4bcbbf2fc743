//! CSV export of filtered feedback.

use crate::models::FeedbackRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use std::path::{Path, PathBuf};

/// Column headers, in row order.
pub const CSV_HEADERS: [&str; 10] = [
    "Date",
    "Mobile",
    "Branch",
    "Overall Experience",
    "Customer Service",
    "Staff Behavior",
    "Jewelry Collection",
    "Would Recommend",
    "Discovery Methods",
    "Comments",
];

/// Render `records` as CSV text with RFC 4180 quoting.
///
/// Dates are calendar days in `tz`; discovery methods share one cell,
/// separated by `"; "`.
pub fn export_csv<Tz: TimeZone>(records: &[FeedbackRecord], tz: &Tz) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS)?;

    for record in records {
        writer.write_record([
            record.day_in(tz).format("%Y-%m-%d").to_string(),
            record.mobile_no.clone(),
            record.branch.clone(),
            record.overall.to_string(),
            record.service.to_string(),
            record.staff.to_string(),
            record.collection.to_string(),
            record.recommend.as_str().to_string(),
            record.discovery_label("; "),
            record.comment.clone().unwrap_or_default(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

/// Default export file name for the given moment.
pub fn default_export_name<Tz: TimeZone>(now: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    PathBuf::from(format!("feedback_report_{}.csv", now.format("%Y-%m-%d")))
}

/// Write the CSV export for `records` to `path`.
pub fn write_csv<Tz: TimeZone>(records: &[FeedbackRecord], tz: &Tz, path: &Path) -> Result<()> {
    let content = export_csv(records, tz)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write CSV export to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::record;
    use crate::models::{DiscoveryMethod, Recommendation};
    use chrono::Utc;

    fn sample() -> FeedbackRecord {
        let mut r = record("1", "BR01", "2024-03-15T09:30:00Z".parse().unwrap(), 5);
        r.recommend = Recommendation::Yes;
        r.discovery_methods = vec![DiscoveryMethod::Television, DiscoveryMethod::SocialMedia];
        r.comment = Some("great, service".to_string());
        r
    }

    #[test]
    fn test_header_row() {
        let csv = export_csv(&[], &Utc).unwrap();
        assert_eq!(
            csv,
            "Date,Mobile,Branch,Overall Experience,Customer Service,Staff Behavior,\
             Jewelry Collection,Would Recommend,Discovery Methods,Comments\n"
        );
    }

    #[test]
    fn test_comment_with_comma_is_quoted() {
        let csv = export_csv(&[sample()], &Utc).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "2024-03-15,9876543210,BR01,5,3,3,3,yes,Television; Social Media,\"great, service\""
        );
    }

    #[test]
    fn test_quotes_and_missing_fields() {
        let mut r = sample();
        r.comment = Some("said \"wow\"".to_string());
        let mut bare = record("2", "BR02", "2024-03-16T09:30:00Z".parse().unwrap(), 1);
        bare.comment = None;

        let csv = export_csv(&[r, bare], &Utc).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with(",\"said \"\"wow\"\"\""));
        assert_eq!(lines[2], "2024-03-16,9876543210,BR02,1,3,3,3,,,");
    }

    #[test]
    fn test_default_export_name() {
        let now: DateTime<Utc> = "2024-03-15T09:30:00Z".parse().unwrap();
        assert_eq!(
            default_export_name(&now),
            PathBuf::from("feedback_report_2024-03-15.csv")
        );
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&[sample()], &Utc, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Date,Mobile"));
        assert!(content.contains("\"great, service\""));
    }
}
