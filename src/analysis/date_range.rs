//! Symbolic date ranges used by the report filters.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// A named window of time relative to "now".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateRange {
    #[default]
    All,
    Today,
    Yesterday,
    Last7Days,
    Last30Days,
    ThisMonth,
    LastMonth,
}

impl DateRange {
    pub const ALL_KEYS: [DateRange; 7] = [
        DateRange::All,
        DateRange::Today,
        DateRange::Yesterday,
        DateRange::Last7Days,
        DateRange::Last30Days,
        DateRange::ThisMonth,
        DateRange::LastMonth,
    ];

    /// Parse a range key. Unknown keys fall back to [`DateRange::All`].
    pub fn from_key(key: &str) -> Self {
        let key = key.trim();
        if key.is_empty() {
            return DateRange::All;
        }

        Self::ALL_KEYS
            .into_iter()
            .find(|range| range.key().eq_ignore_ascii_case(key))
            .unwrap_or_else(|| {
                debug!("Unknown date range '{}', not filtering by date", key);
                DateRange::All
            })
    }

    pub fn key(&self) -> &'static str {
        match self {
            DateRange::All => "all",
            DateRange::Today => "today",
            DateRange::Yesterday => "yesterday",
            DateRange::Last7Days => "last7days",
            DateRange::Last30Days => "last30days",
            DateRange::ThisMonth => "thisMonth",
            DateRange::LastMonth => "lastMonth",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DateRange::All => "All Time",
            DateRange::Today => "Today",
            DateRange::Yesterday => "Yesterday",
            DateRange::Last7Days => "Last 7 Days",
            DateRange::Last30Days => "Last 30 Days",
            DateRange::ThisMonth => "This Month",
            DateRange::LastMonth => "Last Month",
        }
    }

    /// Earliest instant (inclusive) inside the range, or `None` for no bound.
    ///
    /// Day and month boundaries are midnight in the time zone of `now`.
    pub fn lower_bound<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
        let tz = now.timezone();
        let today = now.date_naive();

        match self {
            DateRange::All => None,
            DateRange::Today => midnight(&tz, today),
            DateRange::Yesterday => midnight(&tz, today - Duration::days(1)),
            DateRange::Last7Days => Some((now.clone() - Duration::days(7)).with_timezone(&Utc)),
            DateRange::Last30Days => Some((now.clone() - Duration::days(30)).with_timezone(&Utc)),
            DateRange::ThisMonth => midnight(&tz, first_of_month(today)),
            DateRange::LastMonth => midnight(&tz, first_of_month(first_of_month(today) - Duration::days(1))),
        }
    }

    /// Exclusive end of the historical ranges.
    ///
    /// Only `Yesterday` and `LastMonth` have a natural end; the others run
    /// through `now`. Callers opt in to applying it.
    pub fn upper_bound<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
        let tz = now.timezone();
        let today = now.date_naive();

        match self {
            DateRange::Yesterday => midnight(&tz, today),
            DateRange::LastMonth => midnight(&tz, first_of_month(today)),
            _ => None,
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

/// Start of `day` in `tz`. Skipped midnights (DST) resolve to the earliest
/// valid instant after them.
fn midnight<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> Option<DateTime<Utc>> {
    let naive = day.and_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}
