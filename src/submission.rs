//! Feedback submission: link validation and the one-shot submit workflow.

use crate::client::FeedbackClient;
use crate::error::FeedbackError;
use crate::models::{DiscoveryMethod, FeedbackSubmission, Rating, Recommendation};
use std::future::Future;
use tracing::{info, warn};

/// Mobile number and branch code carried by a feedback link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteParams {
    pub mobile_no: String,
    pub branch: String,
}

impl RouteParams {
    /// Accepts exactly ten ASCII digits, nothing else, and a non-blank
    /// branch code.
    pub fn parse(mobile_no: &str, branch: &str) -> Result<Self, FeedbackError> {
        let branch = branch.trim();

        let valid_mobile = mobile_no.len() == 10 && mobile_no.bytes().all(|b| b.is_ascii_digit());
        if !valid_mobile || branch.is_empty() {
            return Err(FeedbackError::InvalidRoute);
        }

        Ok(Self {
            mobile_no: mobile_no.to_string(),
            branch: branch.to_string(),
        })
    }
}

/// Raw answers as typed in, before validation.
#[derive(Debug, Clone, Default)]
pub struct FormAnswers {
    /// Overall, service, staff, collection.
    pub ratings: [u8; 4],
    pub recommend: Option<String>,
    pub discovery: Vec<String>,
    pub comment: Option<String>,
    pub daily_rate_message: Option<String>,
}

impl FormAnswers {
    /// Validate the answers into a submission bound to `route`.
    pub fn into_submission(self, route: &RouteParams) -> Result<FeedbackSubmission, FeedbackError> {
        let [overall, service, staff, collection] = self.ratings;

        let mut discovery_methods: Vec<DiscoveryMethod> = Vec::new();
        for tag in self.discovery.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            let method = DiscoveryMethod::from(tag);
            if !method.is_known() {
                let known: Vec<&str> = DiscoveryMethod::KNOWN.iter().map(|m| m.label()).collect();
                warn!(
                    "Unknown discovery method '{}' (expected one of: {}), keeping it as entered",
                    tag,
                    known.join(", ")
                );
            }
            if !discovery_methods.contains(&method) {
                discovery_methods.push(method);
            }
        }

        Ok(FeedbackSubmission {
            mobile_no: route.mobile_no.clone(),
            branch: route.branch.clone(),
            overall: Rating::new("overall", overall)?,
            service: Rating::new("service", service)?,
            staff: Rating::new("staff", staff)?,
            collection: Rating::new("collection", collection)?,
            recommend: self
                .recommend
                .as_deref()
                .map(parse_recommendation)
                .unwrap_or_default(),
            daily_rate_message: self.daily_rate_message.unwrap_or_default(),
            discovery_methods,
            comment: self.comment.unwrap_or_default(),
        })
    }
}

/// Typed answers are matched case-insensitively, unlike the wire format.
fn parse_recommendation(answer: &str) -> Recommendation {
    let answer = answer.trim().to_lowercase();
    let recommend = Recommendation::from(answer.as_str());
    if recommend == Recommendation::Unset && !answer.is_empty() {
        warn!("Unrecognized recommendation '{}', leaving it unanswered", answer);
    }
    recommend
}

/// Where a submission currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Succeeded,
    /// The last attempt failed; the form is still available for edits.
    Failed(String),
}

/// Shown once the service has accepted the feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub branch: String,
}

impl Confirmation {
    pub fn message(&self) -> String {
        format!(
            "Thank You! Your feedback for branch {} has been submitted successfully. \
             We appreciate your time and valuable input.",
            self.branch
        )
    }
}

/// One-shot submit workflow for a single feedback form.
///
/// The form is dropped once the service accepts it. A failed attempt keeps
/// the form and the error message; resubmitting is up to the caller.
#[derive(Debug)]
pub struct SubmissionWorkflow {
    route: RouteParams,
    form: Option<FeedbackSubmission>,
    state: SubmissionState,
}

impl SubmissionWorkflow {
    pub fn new(route: RouteParams, form: FeedbackSubmission) -> Self {
        Self {
            route,
            form: Some(form),
            state: SubmissionState::Idle,
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state == SubmissionState::Submitting
    }

    /// Last failure message, if the previous attempt failed.
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SubmissionState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn form(&self) -> Option<&FeedbackSubmission> {
        self.form.as_ref()
    }

    /// Edit the form. Not available while submitting or after success.
    #[allow(dead_code)] // The CLI submits once; edits are for interactive front ends
    pub fn form_mut(&mut self) -> Option<&mut FeedbackSubmission> {
        if self.is_busy() {
            return None;
        }
        self.form.as_mut()
    }

    /// Clear every answer, keeping the mobile number and branch.
    #[allow(dead_code)] // The CLI submits once; reset is for interactive front ends
    pub fn reset(&mut self) {
        if self.is_busy() || self.state == SubmissionState::Succeeded {
            return;
        }
        self.form = Some(FeedbackSubmission::blank(&self.route.mobile_no, &self.route.branch));
        self.state = SubmissionState::Idle;
    }

    /// Submit through the feedback service.
    pub async fn submit(&mut self, client: &FeedbackClient) -> Result<Confirmation, FeedbackError> {
        self.submit_with(|form| async move { client.submit(&form).await })
            .await
    }

    /// Submit with an arbitrary sender. The sender receives an owned copy of
    /// the form so a failure leaves the original untouched.
    pub async fn submit_with<S, Fut>(&mut self, send: S) -> Result<Confirmation, FeedbackError>
    where
        S: FnOnce(FeedbackSubmission) -> Fut,
        Fut: Future<Output = Result<(), FeedbackError>>,
    {
        match self.state {
            SubmissionState::Submitting => return Err(FeedbackError::SubmissionInProgress),
            SubmissionState::Succeeded => return Err(FeedbackError::AlreadySubmitted),
            _ => {}
        }
        let form = self.form.clone().ok_or(FeedbackError::AlreadySubmitted)?;

        self.state = SubmissionState::Submitting;
        match send(form).await {
            Ok(()) => {
                info!("Feedback submitted for branch {}", self.route.branch);
                self.form = None;
                self.state = SubmissionState::Succeeded;
                Ok(Confirmation {
                    branch: self.route.branch.clone(),
                })
            }
            Err(e) => {
                warn!("Feedback submission failed: {}", e);
                self.state = SubmissionState::Failed(e.to_string());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn route() -> RouteParams {
        RouteParams::parse("9876543210", "BR01").unwrap()
    }

    fn answers() -> FormAnswers {
        FormAnswers {
            ratings: [5, 4, 4, 3],
            recommend: Some("yes".to_string()),
            discovery: vec!["Television".to_string(), " notice ".to_string(), "television".to_string()],
            comment: Some("Friendly staff".to_string()),
            daily_rate_message: None,
        }
    }

    #[test]
    fn test_route_params() {
        assert!(RouteParams::parse("9876543210", "BR01").is_ok());
        assert_eq!(
            RouteParams::parse("12345", "BR01"),
            Err(FeedbackError::InvalidRoute)
        );
        assert_eq!(
            RouteParams::parse("98765abcde", "BR01"),
            Err(FeedbackError::InvalidRoute)
        );
        assert_eq!(
            RouteParams::parse("9876543210", "  "),
            Err(FeedbackError::InvalidRoute)
        );
        assert_eq!(
            RouteParams::parse("", ""),
            Err(FeedbackError::InvalidRoute)
        );
    }

    #[test]
    fn test_route_params_reject_padded_mobile() {
        assert_eq!(
            RouteParams::parse(" 9876543210 ", "BR01"),
            Err(FeedbackError::InvalidRoute)
        );
        assert_eq!(
            RouteParams::parse("9876543210\n", "BR01"),
            Err(FeedbackError::InvalidRoute)
        );
    }

    #[test]
    fn test_typed_recommendation_is_case_insensitive() {
        let mut typed = answers();
        typed.recommend = Some(" YES ".to_string());
        let form = typed.into_submission(&route()).unwrap();
        assert_eq!(form.recommend, Recommendation::Yes);

        let mut typed = answers();
        typed.recommend = Some("maybe".to_string());
        let form = typed.into_submission(&route()).unwrap();
        assert_eq!(form.recommend, Recommendation::Unset);
    }

    #[test]
    fn test_confirmation_names_branch() {
        let confirmation = Confirmation {
            branch: "BR07".to_string(),
        };
        let message = confirmation.message();
        assert!(message.starts_with("Thank You!"));
        assert!(message.contains("branch BR07"));
    }

    #[test]
    fn test_answers_into_submission() {
        let form = answers().into_submission(&route()).unwrap();
        assert_eq!(form.mobile_no, "9876543210");
        assert_eq!(form.overall.get(), 5);
        assert_eq!(form.recommend, Recommendation::Yes);
        assert_eq!(
            form.discovery_methods,
            vec![DiscoveryMethod::Television, DiscoveryMethod::Notice]
        );
        assert_eq!(form.comment, "Friendly staff");
    }

    #[test]
    fn test_answers_reject_out_of_range_rating() {
        let mut bad = answers();
        bad.ratings[2] = 6;
        assert_eq!(
            bad.into_submission(&route()),
            Err(FeedbackError::InvalidRating {
                field: "staff",
                value: 6
            })
        );
    }

    #[test]
    fn test_successful_submit_consumes_form() {
        let form = answers().into_submission(&route()).unwrap();
        let mut workflow = SubmissionWorkflow::new(route(), form.clone());

        let confirmation = tokio_test::block_on(workflow.submit_with(|sent| async move {
            assert_eq!(sent, form);
            Ok(())
        }))
        .unwrap();

        assert_eq!(confirmation.branch, "BR01");
        assert_eq!(workflow.state(), &SubmissionState::Succeeded);
        assert!(workflow.form().is_none());

        let again = tokio_test::block_on(workflow.submit_with(|_| async { Ok(()) }));
        assert_eq!(again, Err(FeedbackError::AlreadySubmitted));
    }

    #[test]
    fn test_failed_submit_keeps_form_editable() {
        let form = answers().into_submission(&route()).unwrap();
        let mut workflow = SubmissionWorkflow::new(route(), form);
        let attempts = Cell::new(0);

        let result = tokio_test::block_on(workflow.submit_with(|_| {
            attempts.set(attempts.get() + 1);
            async { Err(FeedbackError::Submit("HTTP 500".to_string())) }
        }));
        assert!(result.is_err());
        assert_eq!(attempts.get(), 1);
        assert_eq!(workflow.error(), Some("Failed to submit feedback: HTTP 500"));

        workflow.form_mut().unwrap().comment = "Edited".to_string();
        let confirmation = tokio_test::block_on(workflow.submit_with(|sent| async move {
            assert_eq!(sent.comment, "Edited");
            Ok(())
        }));
        assert!(confirmation.is_ok());
    }

    #[test]
    fn test_reset_keeps_route() {
        let form = answers().into_submission(&route()).unwrap();
        let mut workflow = SubmissionWorkflow::new(route(), form);

        workflow.reset();
        let form = workflow.form().unwrap();
        assert_eq!(form, &FeedbackSubmission::blank("9876543210", "BR01"));
        assert_eq!(workflow.state(), &SubmissionState::Idle);
    }
}
