//! HTTP client for the remote feedback service.

use crate::config::ServiceConfig;
use crate::error::FeedbackError;
use crate::models::{FeedbackRecord, FeedbackSubmission, ReportEnvelope};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Thin wrapper over the service's submit, report and events endpoints.
#[derive(Debug, Clone)]
pub struct FeedbackClient {
    http_client: reqwest::Client,
    base_url: String,
    timeout_seconds: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventResponse {
    #[serde(default)]
    current_event: Option<String>,
}

impl FeedbackClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, FeedbackError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| FeedbackError::Fetch(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Fetch every submitted record, newest first.
    pub async fn fetch_report(&self) -> Result<Vec<FeedbackRecord>, FeedbackError> {
        let url = self.url("feedback_report");
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| FeedbackError::from_fetch(&e, &self.base_url, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FeedbackError::Fetch(format!("HTTP {}: {}", status, body.trim())));
        }

        let envelope: ReportEnvelope = response
            .json()
            .await
            .map_err(|e| FeedbackError::from_fetch(&e, &self.base_url, self.timeout_seconds))?;

        let mut records = envelope.data;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        info!("Fetched {} feedback records", records.len());

        Ok(records)
    }

    /// Post one submission. Only success or failure is read from the reply.
    pub async fn submit(&self, submission: &FeedbackSubmission) -> Result<(), FeedbackError> {
        let url = self.url("feedback_submit");
        debug!("POST {} for branch {}", url, submission.branch);

        let response = self
            .http_client
            .post(&url)
            .json(submission)
            .send()
            .await
            .map_err(|e| FeedbackError::from_submit(&e, &self.base_url, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FeedbackError::Submit(format!("HTTP {}: {}", status, body.trim())));
        }

        Ok(())
    }

    /// Name of the event currently being promoted, if the service has one.
    ///
    /// Failures only cost the prompt its event name, so they are logged and
    /// swallowed.
    pub async fn current_event(&self) -> Option<String> {
        let url = self.url("events");

        let response = match self.http_client.get(&url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!("Failed to fetch current event: HTTP {}", response.status());
                return None;
            }
            Err(e) => {
                warn!("Failed to fetch current event: {}", e);
                return None;
            }
        };

        match response.json::<EventResponse>().await {
            Ok(event) => event.current_event.filter(|name| !name.trim().is_empty()),
            Err(e) => {
                warn!("Failed to parse current event: {}", e);
                None
            }
        }
    }
}
