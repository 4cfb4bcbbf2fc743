//! Domain errors.
//!
//! Every failure a user can hit while submitting or reporting is reduced to
//! one of these variants and, ultimately, to a human-readable message.

use thiserror::Error;

/// Message shown when the submission link is malformed.
pub const INVALID_ROUTE_MESSAGE: &str =
    "Invalid or missing mobile number or branch code. Please use the link sent to your mobile.";

/// Message shown when the report cannot be loaded.
pub const FETCH_FAILED_MESSAGE: &str = "Error fetching feedback data. Please try again later.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedbackError {
    /// The report could not be fetched or decoded.
    #[error("{} ({})", FETCH_FAILED_MESSAGE, .0)]
    Fetch(String),

    /// The feedback service rejected or never received a submission.
    #[error("Failed to submit feedback: {0}")]
    Submit(String),

    /// Mobile number or branch code taken from the link is unusable.
    #[error("{}", INVALID_ROUTE_MESSAGE)]
    InvalidRoute,

    #[error("Rating for {field} must be between 0 and 5, got {value}")]
    InvalidRating { field: &'static str, value: u8 },

    #[error("A submission is already in progress")]
    SubmissionInProgress,

    #[error("Feedback has already been submitted")]
    AlreadySubmitted,
}

impl FeedbackError {
    /// Build a fetch error from a transport failure, keeping the useful part.
    pub fn from_fetch(err: &reqwest::Error, base_url: &str, timeout_seconds: u64) -> Self {
        FeedbackError::Fetch(describe_transport_error(err, base_url, timeout_seconds))
    }

    /// Build a submit error from a transport failure.
    pub fn from_submit(err: &reqwest::Error, base_url: &str, timeout_seconds: u64) -> Self {
        FeedbackError::Submit(describe_transport_error(err, base_url, timeout_seconds))
    }
}

fn describe_transport_error(err: &reqwest::Error, base_url: &str, timeout_seconds: u64) -> String {
    if err.is_timeout() {
        format!("request timed out after {}s", timeout_seconds)
    } else if err.is_connect() {
        format!("cannot connect to {}", base_url)
    } else if err.is_decode() {
        format!("malformed response: {}", err)
    } else {
        err.to_string()
    }
}
