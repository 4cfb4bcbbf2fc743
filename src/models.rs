//! Data models for feedback collection and reporting.
//!
//! This module contains the wire records exchanged with the feedback
//! service and the derived structures produced by the aggregation engine.

use crate::error::FeedbackError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Highest value any rating dimension may take.
pub const MAX_RATING: u8 = 5;

/// A star rating in the range 0-5. Zero means "not rated".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Validate a rating for the named dimension.
    pub fn new(field: &'static str, value: u8) -> Result<Self, FeedbackError> {
        if value > MAX_RATING {
            return Err(FeedbackError::InvalidRating { field, value });
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }
}

impl TryFrom<u8> for Rating {
    type Error = FeedbackError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new("rating", value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether the respondent would recommend the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Recommendation {
    Yes,
    No,
    /// The question was left unanswered.
    #[default]
    Unset,
}

impl Recommendation {
    /// Wire representation; unset is the empty string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Yes => "yes",
            Recommendation::No => "no",
            Recommendation::Unset => "",
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, Recommendation::Yes)
    }
}

/// Only the exact wire values `yes` and `no` count; anything else is unset.
impl From<&str> for Recommendation {
    fn from(s: &str) -> Self {
        match s {
            "yes" => Recommendation::Yes,
            "no" => Recommendation::No,
            _ => Recommendation::Unset,
        }
    }
}

impl From<Option<String>> for Recommendation {
    fn from(value: Option<String>) -> Self {
        value.as_deref().map(Recommendation::from).unwrap_or_default()
    }
}

impl From<Recommendation> for String {
    fn from(value: Recommendation) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Unset => write!(f, "-"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// How the respondent learned about the promoted event.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DiscoveryMethod {
    Television,
    MassMedia,
    SocialMedia,
    Notice,
    NewsPaper,
    Invites,
    /// A tag outside the known vocabulary, kept verbatim.
    Other(String),
}

impl DiscoveryMethod {
    /// The fixed vocabulary offered on the form.
    pub const KNOWN: [DiscoveryMethod; 6] = [
        DiscoveryMethod::Television,
        DiscoveryMethod::MassMedia,
        DiscoveryMethod::SocialMedia,
        DiscoveryMethod::Notice,
        DiscoveryMethod::NewsPaper,
        DiscoveryMethod::Invites,
    ];

    pub fn label(&self) -> &str {
        match self {
            DiscoveryMethod::Television => "Television",
            DiscoveryMethod::MassMedia => "Mass Media",
            DiscoveryMethod::SocialMedia => "Social Media",
            DiscoveryMethod::Notice => "Notice",
            DiscoveryMethod::NewsPaper => "News Paper",
            DiscoveryMethod::Invites => "Invites",
            DiscoveryMethod::Other(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, DiscoveryMethod::Other(_))
    }
}

impl From<&str> for DiscoveryMethod {
    fn from(s: &str) -> Self {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "television" | "tv" => DiscoveryMethod::Television,
            "massmedia" => DiscoveryMethod::MassMedia,
            "socialmedia" => DiscoveryMethod::SocialMedia,
            "notice" => DiscoveryMethod::Notice,
            "newspaper" => DiscoveryMethod::NewsPaper,
            "invites" | "invite" => DiscoveryMethod::Invites,
            _ => DiscoveryMethod::Other(s.trim().to_string()),
        }
    }
}

impl From<String> for DiscoveryMethod {
    fn from(s: String) -> Self {
        DiscoveryMethod::from(s.as_str())
    }
}

impl From<DiscoveryMethod> for String {
    fn from(value: DiscoveryMethod) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single submitted feedback entry as returned by the report endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    /// Server-assigned identifier (string or number on the wire).
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mobile_no: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub branch: String,
    #[serde(rename = "overallExperience")]
    pub overall: Rating,
    #[serde(rename = "customerService")]
    pub service: Rating,
    #[serde(rename = "staffBehavior")]
    pub staff: Rating,
    #[serde(rename = "jewelryCollection")]
    pub collection: Rating,
    #[serde(rename = "wouldRecommend", default)]
    pub recommend: Recommendation,
    #[serde(default, deserialize_with = "null_as_default")]
    pub discovery_methods: Vec<DiscoveryMethod>,
    #[serde(rename = "additionalComments", default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl FeedbackRecord {
    /// Calendar day the record was created on, in the given time zone.
    pub fn day_in<Tz: chrono::TimeZone>(&self, tz: &Tz) -> NaiveDate {
        self.created_at.with_timezone(tz).date_naive()
    }

    /// Discovery tags joined for single-cell display.
    pub fn discovery_label(&self, separator: &str) -> String {
        self.discovery_methods
            .iter()
            .map(|m| m.label())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of the report endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportEnvelope {
    #[serde(default)]
    pub data: Vec<FeedbackRecord>,
}

/// Form data posted to the submit endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSubmission {
    pub mobile_no: String,
    pub branch: String,
    #[serde(rename = "overallExperience")]
    pub overall: Rating,
    #[serde(rename = "customerService")]
    pub service: Rating,
    #[serde(rename = "staffBehavior")]
    pub staff: Rating,
    #[serde(rename = "jewelryCollection")]
    pub collection: Rating,
    #[serde(rename = "wouldRecommend")]
    pub recommend: Recommendation,
    #[serde(rename = "dailyratemessage", skip_serializing_if = "String::is_empty")]
    pub daily_rate_message: String,
    pub discovery_methods: Vec<DiscoveryMethod>,
    #[serde(rename = "additionalComments")]
    pub comment: String,
}

impl FeedbackSubmission {
    /// Blank form bound to a mobile number and branch.
    pub fn blank(mobile_no: &str, branch: &str) -> Self {
        Self {
            mobile_no: mobile_no.to_string(),
            branch: branch.to_string(),
            overall: Rating::default(),
            service: Rating::default(),
            staff: Rating::default(),
            collection: Rating::default(),
            recommend: Recommendation::Unset,
            daily_rate_message: String::new(),
            discovery_methods: Vec::new(),
            comment: String::new(),
        }
    }
}

/// Per-branch slice of the summary metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchPerformance {
    pub total: usize,
    /// Average overall rating.
    pub average: f64,
    /// Percentage of "yes" recommendations.
    pub recommendation: f64,
}

/// Average of each rating dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AverageRatings {
    pub overall: f64,
    pub service: f64,
    pub staff: f64,
    pub collection: f64,
}

/// Summary metrics over a filtered record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub total_responses: usize,
    pub average_ratings: AverageRatings,
    pub recommendation_rate: f64,
    pub branch_performance: BTreeMap<String, BranchPerformance>,
}

/// Responses received on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineBucket {
    pub date: NaiveDate,
    pub count: usize,
    pub total_rating: u32,
    pub average_rating: f64,
}

/// Per-branch averages for the rating chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeriesPoint {
    pub branch: String,
    pub ratings: AverageRatings,
}

/// How often a discovery method was picked within a record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryShare {
    pub method: DiscoveryMethod,
    pub count: usize,
    /// Share of records carrying the tag, one decimal.
    pub percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": 42,
        "createdAt": "2024-03-05T10:15:00.000Z",
        "mobileNo": "9876543210",
        "branch": "B1",
        "overallExperience": 4,
        "customerService": 5,
        "staffBehavior": 3,
        "jewelryCollection": 0,
        "wouldRecommend": "yes",
        "discoveryMethods": ["Television", "Social Media", "Billboard"],
        "additionalComments": "great, service"
    }"#;

    #[test]
    fn test_record_from_wire() {
        let record: FeedbackRecord = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(record.id, "42");
        assert_eq!(record.branch, "B1");
        assert_eq!(record.overall.get(), 4);
        assert_eq!(record.collection.get(), 0);
        assert_eq!(record.recommend, Recommendation::Yes);
        assert_eq!(
            record.discovery_methods,
            vec![
                DiscoveryMethod::Television,
                DiscoveryMethod::SocialMedia,
                DiscoveryMethod::Other("Billboard".to_string()),
            ]
        );
        assert_eq!(record.comment.as_deref(), Some("great, service"));
    }

    #[test]
    fn test_record_rejects_out_of_range_rating() {
        let bad = SAMPLE.replace("\"overallExperience\": 4", "\"overallExperience\": 7");
        assert!(serde_json::from_str::<FeedbackRecord>(&bad).is_err());
    }

    #[test]
    fn test_missing_recommendation_is_unset() {
        let json = SAMPLE.replace("\"wouldRecommend\": \"yes\",", "");
        let record: FeedbackRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record.recommend, Recommendation::Unset);

        let json = SAMPLE.replace("\"yes\"", "null");
        let record: FeedbackRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record.recommend, Recommendation::Unset);
    }

    #[test]
    fn test_null_text_fields_decode_as_empty() {
        let json = SAMPLE
            .replace("\"9876543210\"", "null")
            .replace("\"B1\"", "null")
            .replace("[\"Television\", \"Social Media\", \"Billboard\"]", "null")
            .replace("\"great, service\"", "null");
        let body = format!("{{\"data\": [{}]}}", json);

        let envelope: ReportEnvelope = serde_json::from_str(&body).unwrap();
        let record = &envelope.data[0];
        assert_eq!(record.mobile_no, "");
        assert_eq!(record.branch, "");
        assert!(record.discovery_methods.is_empty());
        assert_eq!(record.comment, None);
    }

    #[test]
    fn test_recommendation_requires_exact_wire_value() {
        for (wire, expected) in [
            ("yes", Recommendation::Yes),
            ("no", Recommendation::No),
            ("YES", Recommendation::Unset),
            ("Y", Recommendation::Unset),
            ("n", Recommendation::Unset),
        ] {
            let json = SAMPLE.replace("\"yes\"", &format!("\"{}\"", wire));
            let record: FeedbackRecord = serde_json::from_str(&json).unwrap();
            assert_eq!(record.recommend, expected, "wire value {:?}", wire);
        }
    }

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new("overall", 5).is_ok());
        assert_eq!(
            Rating::new("staff", 6),
            Err(FeedbackError::InvalidRating {
                field: "staff",
                value: 6
            })
        );
    }

    #[test]
    fn test_discovery_method_from_str() {
        assert_eq!(DiscoveryMethod::from("news paper"), DiscoveryMethod::NewsPaper);
        assert_eq!(DiscoveryMethod::from("Mass Media"), DiscoveryMethod::MassMedia);
        assert_eq!(DiscoveryMethod::from("social_media"), DiscoveryMethod::SocialMedia);
        assert!(!DiscoveryMethod::from("Radio").is_known());
    }

    #[test]
    fn test_submission_wire_shape() {
        let mut form = FeedbackSubmission::blank("9876543210", "B1");
        form.overall = Rating::new("overall", 5).unwrap();
        form.recommend = Recommendation::No;
        form.discovery_methods = vec![DiscoveryMethod::Invites];

        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["mobileNo"], "9876543210");
        assert_eq!(json["overallExperience"], 5);
        assert_eq!(json["wouldRecommend"], "no");
        assert_eq!(json["discoveryMethods"][0], "Invites");
        assert_eq!(json["additionalComments"], "");
        assert!(json.get("dailyratemessage").is_none());
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_unset_recommendation_serializes_empty() {
        let form = FeedbackSubmission::blank("9876543210", "B1");
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["wouldRecommend"], "");
    }
}
