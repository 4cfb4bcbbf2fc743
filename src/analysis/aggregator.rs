//! Feedback aggregation and statistics.
//!
//! Pure functions turning a record slice into the figures shown on the
//! report. Nothing here keeps state between calls.

use crate::models::{
    AverageRatings, BranchPerformance, ChartSeriesPoint, DerivedMetrics, DiscoveryMethod,
    DiscoveryShare, FeedbackRecord, Rating, TimelineBucket,
};
use chrono::{NaiveDate, TimeZone};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Round to two decimals, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to one decimal, half away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Sorted, de-duplicated branch identifiers.
pub fn unique_branches(records: &[FeedbackRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.branch.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Mean of one rating dimension, 0 for an empty slice.
fn mean<F>(records: &[&FeedbackRecord], rating: F) -> f64
where
    F: Fn(&FeedbackRecord) -> Rating,
{
    if records.is_empty() {
        return 0.0;
    }
    let total: f64 = records.iter().map(|r| rating(*r).as_f64()).sum();
    total / records.len() as f64
}

fn recommendation_rate(records: &[&FeedbackRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let yes = records.iter().filter(|r| r.recommend.is_yes()).count();
    (yes as f64 / records.len() as f64) * 100.0
}

fn average_ratings(records: &[&FeedbackRecord]) -> AverageRatings {
    AverageRatings {
        overall: round2(mean(records, |r| r.overall)),
        service: round2(mean(records, |r| r.service)),
        staff: round2(mean(records, |r| r.staff)),
        collection: round2(mean(records, |r| r.collection)),
    }
}

fn records_for_branch<'a>(records: &'a [FeedbackRecord], branch: &str) -> Vec<&'a FeedbackRecord> {
    records.iter().filter(|r| r.branch == branch).collect()
}

/// Summary metrics for the filtered set, or `None` when it is empty.
///
/// Branches in `known_branches` without any filtered record are left out
/// of the per-branch map.
pub fn compute_metrics(
    filtered: &[FeedbackRecord],
    known_branches: &[String],
) -> Option<DerivedMetrics> {
    if filtered.is_empty() {
        return None;
    }

    let all: Vec<&FeedbackRecord> = filtered.iter().collect();

    let mut branch_performance = BTreeMap::new();
    for branch in known_branches {
        let branch_records = records_for_branch(filtered, branch);
        if branch_records.is_empty() {
            continue;
        }
        branch_performance.insert(
            branch.clone(),
            BranchPerformance {
                total: branch_records.len(),
                average: round2(mean(&branch_records, |r| r.overall)),
                recommendation: round2(recommendation_rate(&branch_records)),
            },
        );
    }

    Some(DerivedMetrics {
        total_responses: filtered.len(),
        average_ratings: average_ratings(&all),
        recommendation_rate: round2(recommendation_rate(&all)),
        branch_performance,
    })
}

/// Per-branch averages of every rating dimension over the full dataset.
///
/// A branch with no records gets zeroes rather than being dropped, so the
/// series always lines up with `known_branches`.
pub fn compute_chart_series(
    records: &[FeedbackRecord],
    known_branches: &[String],
) -> Vec<ChartSeriesPoint> {
    known_branches
        .iter()
        .map(|branch| ChartSeriesPoint {
            branch: branch.clone(),
            ratings: average_ratings(&records_for_branch(records, branch)),
        })
        .collect()
}

/// Daily response counts and running average overall rating, oldest first.
pub fn compute_timeline<Tz: TimeZone>(records: &[FeedbackRecord], tz: &Tz) -> Vec<TimelineBucket> {
    let mut days: BTreeMap<NaiveDate, TimelineBucket> = BTreeMap::new();

    for record in records {
        let date = record.day_in(tz);
        let bucket = days.entry(date).or_insert_with(|| TimelineBucket {
            date,
            count: 0,
            total_rating: 0,
            average_rating: 0.0,
        });
        bucket.count += 1;
        bucket.total_rating += u32::from(record.overall.get());
        bucket.average_rating = round2(f64::from(bucket.total_rating) / bucket.count as f64);
    }

    days.into_values().collect()
}

/// How often each discovery method appears in `records`.
///
/// Percentages are relative to the number of records, so they need not
/// add up to 100 when respondents tick several boxes.
pub fn discovery_breakdown(records: &[FeedbackRecord]) -> Vec<DiscoveryShare> {
    if records.is_empty() {
        return Vec::new();
    }

    let mut counts: HashMap<DiscoveryMethod, usize> = HashMap::new();
    for record in records {
        for method in &record.discovery_methods {
            *counts.entry(method.clone()).or_default() += 1;
        }
    }

    let total = records.len() as f64;
    let mut shares: Vec<DiscoveryShare> = counts
        .into_iter()
        .map(|(method, count)| DiscoveryShare {
            percent: round1(count as f64 / total * 100.0),
            method,
            count,
        })
        .collect();

    shares.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.method.label().cmp(b.method.label()))
    });
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{record, record_with};
    use crate::models::Recommendation;
    use chrono::{DateTime, Duration, FixedOffset, Utc};

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_metrics_empty() {
        assert_eq!(compute_metrics(&[], &["B1".to_string()]), None);
    }

    #[test]
    fn test_metrics_means_and_rounding() {
        let now = Utc::now();
        let records = vec![
            record_with("1", "B1", now, [5, 4, 3, 1], Recommendation::Yes),
            record_with("2", "B1", now, [4, 4, 2, 0], Recommendation::No),
            record_with("3", "B2", now, [4, 3, 2, 2], Recommendation::Unset),
        ];
        let branches = unique_branches(&records);

        let metrics = compute_metrics(&records, &branches).unwrap();
        assert_eq!(metrics.total_responses, 3);
        assert_eq!(metrics.average_ratings.overall, 4.33);
        assert_eq!(metrics.average_ratings.service, 3.67);
        assert_eq!(metrics.average_ratings.staff, 2.33);
        assert_eq!(metrics.average_ratings.collection, 1.0);
        assert_eq!(metrics.recommendation_rate, 33.33);

        let b1 = &metrics.branch_performance["B1"];
        assert_eq!(b1.total, 2);
        assert_eq!(b1.average, 4.5);
        assert_eq!(b1.recommendation, 50.0);
        assert_eq!(metrics.branch_performance["B2"].recommendation, 0.0);
    }

    #[test]
    fn test_recommendation_rate_half() {
        let now = Utc::now();
        let records = vec![
            record_with("1", "B1", now, [3, 3, 3, 3], Recommendation::Yes),
            record_with("2", "B1", now, [3, 3, 3, 3], Recommendation::No),
        ];
        let metrics = compute_metrics(&records, &unique_branches(&records)).unwrap();
        assert_eq!(metrics.recommendation_rate, 50.0);
    }

    #[test]
    fn test_metrics_omit_branches_without_records() {
        let now = Utc::now();
        let records = vec![record("1", "B1", now, 4)];
        let known = vec!["B1".to_string(), "B2".to_string()];

        let metrics = compute_metrics(&records, &known).unwrap();
        assert!(metrics.branch_performance.contains_key("B1"));
        assert!(!metrics.branch_performance.contains_key("B2"));
    }

    #[test]
    fn test_chart_series_uses_every_known_branch() {
        let now = Utc::now();
        let records = vec![
            record_with("1", "B1", now, [4, 5, 3, 2], Recommendation::Yes),
            record_with("2", "B1", now, [2, 3, 3, 4], Recommendation::Yes),
        ];
        let known = vec!["B1".to_string(), "B9".to_string()];

        let series = compute_chart_series(&records, &known);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].branch, "B1");
        assert_eq!(
            series[0].ratings,
            AverageRatings {
                overall: 3.0,
                service: 4.0,
                staff: 3.0,
                collection: 3.0,
            }
        );
        assert_eq!(series[1].ratings, AverageRatings::default());
    }

    #[test]
    fn test_timeline_same_day() {
        let records = vec![
            record("1", "B1", ts("2024-03-15T09:00:00Z"), 4),
            record("2", "B2", ts("2024-03-15T17:00:00Z"), 2),
        ];
        let timeline = compute_timeline(&records, &Utc);
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].count, 2);
        assert_eq!(timeline[0].average_rating, 3.0);
        assert_eq!(timeline[0].date.to_string(), "2024-03-15");
    }

    #[test]
    fn test_timeline_sorted_and_year_aware() {
        let records = vec![
            record("1", "B1", ts("2024-03-15T09:00:00Z"), 5),
            record("2", "B1", ts("2023-03-15T09:00:00Z"), 1),
            record("3", "B1", ts("2024-01-02T09:00:00Z"), 3),
        ];
        let dates: Vec<String> = compute_timeline(&records, &Utc)
            .into_iter()
            .map(|b| b.date.to_string())
            .collect();
        assert_eq!(dates, vec!["2023-03-15", "2024-01-02", "2024-03-15"]);
    }

    #[test]
    fn test_timeline_groups_by_local_day() {
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let base = ts("2024-03-15T20:00:00Z");
        let records = vec![record("1", "B1", base, 4), record("2", "B1", base - Duration::hours(3), 4)];

        // 01:30 on the 16th and 22:30 on the 15th in IST.
        assert_eq!(compute_timeline(&records, &ist).len(), 2);
        assert_eq!(compute_timeline(&records, &Utc).len(), 1);
    }

    #[test]
    fn test_discovery_breakdown() {
        let now = Utc::now();
        let mut a = record("1", "B1", now, 4);
        a.discovery_methods = vec![DiscoveryMethod::Television, DiscoveryMethod::Notice];
        let mut b = record("2", "B1", now, 4);
        b.discovery_methods = vec![DiscoveryMethod::Television];
        let c = record("3", "B1", now, 4);

        let shares = discovery_breakdown(&[a, b, c]);
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].method, DiscoveryMethod::Television);
        assert_eq!(shares[0].count, 2);
        assert_eq!(shares[0].percent, 66.7);
        assert_eq!(shares[1].method, DiscoveryMethod::Notice);
        assert_eq!(shares[1].percent, 33.3);

        assert!(discovery_breakdown(&[]).is_empty());
    }

    #[test]
    fn test_unique_branches_sorted() {
        let now = Utc::now();
        let records = vec![
            record("1", "Zeta", now, 1),
            record("2", "Alpha", now, 1),
            record("3", "Zeta", now, 1),
        ];
        assert_eq!(unique_branches(&records), vec!["Alpha", "Zeta"]);
    }
}
