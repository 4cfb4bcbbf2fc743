//! Report session state and the dashboard view-model.
//!
//! A session holds the latest immutable snapshot of fetched records. Every
//! view is rebuilt from that snapshot; nothing is updated incrementally.
//! Refreshes are tagged with a generation so a slow, superseded fetch can
//! never overwrite newer data.

use crate::analysis::{
    compute_chart_series, compute_metrics, compute_timeline, discovery_breakdown, filter_records,
    unique_branches, FilterCriteria,
};
use crate::client::FeedbackClient;
use crate::error::FeedbackError;
use crate::models::{
    ChartSeriesPoint, DerivedMetrics, DiscoveryShare, FeedbackRecord, TimelineBucket,
};
use chrono::{DateTime, TimeZone, Utc};
use futures::future::{AbortHandle, Abortable, Aborted};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Everything the dashboard renders, derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub generated_at: DateTime<Utc>,
    pub criteria: FilterCriteria,
    /// Size of the unfiltered snapshot.
    pub total_records: usize,
    pub branches: Vec<String>,
    pub filtered: Vec<FeedbackRecord>,
    /// Absent when no record passes the filters.
    pub metrics: Option<DerivedMetrics>,
    /// Per-branch averages over the unfiltered snapshot.
    pub chart_series: Vec<ChartSeriesPoint>,
    /// Daily buckets over the unfiltered snapshot.
    pub timeline: Vec<TimelineBucket>,
    pub discovery: Vec<DiscoveryShare>,
}

impl ReportView {
    /// Run the filter pipeline and every aggregation over `records`.
    pub fn build<Tz: TimeZone>(
        records: &[FeedbackRecord],
        criteria: &FilterCriteria,
        now: &DateTime<Tz>,
    ) -> Self {
        let branches = unique_branches(records);
        let filtered = filter_records(records, criteria, now);

        Self {
            generated_at: now.with_timezone(&Utc),
            criteria: criteria.clone(),
            total_records: records.len(),
            metrics: compute_metrics(&filtered, &branches),
            chart_series: compute_chart_series(records, &branches),
            timeline: compute_timeline(records, &now.timezone()),
            discovery: discovery_breakdown(&filtered),
            branches,
            filtered,
        }
    }
}

/// A fetch started by [`ReportSession::track`], not yet applied.
pub struct PendingFetch<F> {
    generation: u64,
    future: Abortable<F>,
}

/// Result of a finished or aborted fetch, ready for [`ReportSession::apply`].
pub struct FetchOutcome {
    generation: u64,
    result: Result<Result<Vec<FeedbackRecord>, FeedbackError>, Aborted>,
}

impl<F> PendingFetch<F>
where
    F: Future<Output = Result<Vec<FeedbackRecord>, FeedbackError>>,
{
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn run(self) -> FetchOutcome {
        FetchOutcome {
            generation: self.generation,
            result: self.future.await,
        }
    }
}

pub struct ReportSession {
    client: FeedbackClient,
    snapshot: Arc<[FeedbackRecord]>,
    generation: u64,
    in_flight: Option<AbortHandle>,
}

impl ReportSession {
    pub fn new(client: FeedbackClient) -> Self {
        Self {
            client,
            snapshot: Arc::from(Vec::new()),
            generation: 0,
            in_flight: None,
        }
    }

    /// The records the current views are built from.
    pub fn snapshot(&self) -> Arc<[FeedbackRecord]> {
        Arc::clone(&self.snapshot)
    }

    /// Register `future` as the newest fetch, aborting any older one.
    pub fn track<F>(&mut self, future: F) -> PendingFetch<F>
    where
        F: Future<Output = Result<Vec<FeedbackRecord>, FeedbackError>>,
    {
        if let Some(previous) = self.in_flight.take() {
            debug!("Aborting superseded fetch (generation {})", self.generation);
            previous.abort();
        }

        self.generation += 1;
        let (handle, registration) = AbortHandle::new_pair();
        self.in_flight = Some(handle);

        PendingFetch {
            generation: self.generation,
            future: Abortable::new(future, registration),
        }
    }

    /// Start a report fetch through the session's client.
    pub fn begin_fetch(
        &mut self,
    ) -> PendingFetch<impl Future<Output = Result<Vec<FeedbackRecord>, FeedbackError>>> {
        let client = self.client.clone();
        self.track(async move { client.fetch_report().await })
    }

    /// Apply a finished fetch.
    ///
    /// Returns `Ok(true)` when the snapshot was replaced and `Ok(false)` when
    /// the outcome was aborted or superseded. Errors are reported only for
    /// the current generation.
    pub fn apply(&mut self, outcome: FetchOutcome) -> Result<bool, FeedbackError> {
        if outcome.generation != self.generation {
            debug!(
                "Discarding stale fetch (generation {}, current {})",
                outcome.generation, self.generation
            );
            return Ok(false);
        }

        self.in_flight = None;
        match outcome.result {
            Err(Aborted) => Ok(false),
            Ok(Err(e)) => Err(e),
            Ok(Ok(records)) => {
                self.snapshot = Arc::from(records);
                Ok(true)
            }
        }
    }

    /// Fetch and install a fresh snapshot.
    pub async fn refresh(&mut self) -> Result<usize, FeedbackError> {
        let pending = self.begin_fetch();
        debug!("Fetching feedback report (generation {})", pending.generation());
        let outcome = pending.run().await;
        self.apply(outcome)?;
        Ok(self.snapshot.len())
    }

    /// Build the dashboard for `criteria` from the current snapshot.
    pub fn view<Tz: TimeZone>(&self, criteria: &FilterCriteria, now: &DateTime<Tz>) -> ReportView {
        ReportView::build(&self.snapshot, criteria, now)
    }
}
