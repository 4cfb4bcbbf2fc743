//! Record filtering for the report view.

use crate::analysis::date_range::DateRange;
use crate::models::FeedbackRecord;
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Sentinel meaning "no branch filter".
pub const ALL_BRANCHES: &str = "all";

/// Filters selected on the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Branch to keep, or [`ALL_BRANCHES`].
    pub branch: String,
    pub date_range: DateRange,
    /// Case-insensitive text matched against mobile, branch and comment.
    pub search: String,
    /// Apply the natural end of historical ranges as well as their start.
    #[serde(default)]
    pub bounded: bool,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            branch: ALL_BRANCHES.to_string(),
            date_range: DateRange::All,
            search: String::new(),
            bounded: false,
        }
    }
}

impl FilterCriteria {
    pub fn new(branch: Option<&str>, range_key: Option<&str>, search: Option<&str>) -> Self {
        Self {
            branch: branch
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .unwrap_or(ALL_BRANCHES)
                .to_string(),
            date_range: range_key.map(DateRange::from_key).unwrap_or_default(),
            search: search.map(str::trim).unwrap_or_default().to_string(),
            bounded: false,
        }
    }

    pub fn with_bounded(mut self, bounded: bool) -> Self {
        self.bounded = bounded;
        self
    }

    /// True when no predicate would drop anything.
    pub fn is_passthrough(&self) -> bool {
        self.branch == ALL_BRANCHES && self.date_range == DateRange::All && self.search.is_empty()
    }
}

/// Apply `criteria` to `records`, preserving input order.
pub fn filter_records<Tz: TimeZone>(
    records: &[FeedbackRecord],
    criteria: &FilterCriteria,
    now: &DateTime<Tz>,
) -> Vec<FeedbackRecord> {
    if criteria.is_passthrough() {
        return records.to_vec();
    }

    let mut filtered: Vec<&FeedbackRecord> = records.iter().collect();

    if criteria.branch != ALL_BRANCHES {
        filtered.retain(|r| r.branch == criteria.branch);
    }

    if criteria.date_range != DateRange::All {
        if let Some(start) = criteria.date_range.lower_bound(now) {
            filtered.retain(|r| r.created_at >= start);
        }
        if criteria.bounded {
            if let Some(end) = criteria.date_range.upper_bound(now) {
                filtered.retain(|r| r.created_at < end);
            }
        }
    }

    if !criteria.search.is_empty() {
        let needle = criteria.search.to_lowercase();
        filtered.retain(|r| matches_search(r, &needle));
    }

    filtered.into_iter().cloned().collect()
}

/// `needle` must already be lowercase.
fn matches_search(record: &FeedbackRecord, needle: &str) -> bool {
    record.mobile_no.to_lowercase().contains(needle)
        || record.branch.to_lowercase().contains(needle)
        || record
            .comment
            .as_deref()
            .map(|c| c.to_lowercase().contains(needle))
            .unwrap_or(false)
}
