use crate::locations;
use crate::sentiment::{SentimentScorer, SentimentScores};
use crate::storage::{ReviewFilter, ReviewStore};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ReviewStore>,
    pub scorer: Arc<dyn SentimentScorer>,
}

/// Raw GET query parameters, validated once at the handler boundary.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewQuery {
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl ReviewQuery {
    /// Validate into a store filter. Empty values count as absent; a date
    /// that fails to parse rejects the whole request.
    pub fn into_filter(self) -> Result<ReviewFilter, AppError> {
        let mut filter = ReviewFilter {
            location: self.location.filter(|l| !l.is_empty()),
            ..Default::default()
        };

        if let Some(raw) = self.start_date.filter(|s| !s.is_empty()) {
            filter.start = Some(parse_date_bound("start_date", &raw)?);
        }
        if let Some(raw) = self.end_date.filter(|s| !s.is_empty()) {
            filter.end = Some(parse_date_bound("end_date", &raw)?);
        }

        Ok(filter)
    }
}

fn parse_date_bound(name: &str, raw: &str) -> Result<chrono::NaiveDateTime, AppError> {
    let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
        AppError::BadRequest(format!("Invalid {name} '{raw}': expected YYYY-MM-DD"))
    })?;
    // Bounds sit at midnight of the given day
    Ok(date.and_time(chrono::NaiveTime::MIN))
}

/// URL-encoded form body for a review submission
#[derive(Debug, Default, Deserialize)]
pub struct SubmitReviewForm {
    #[serde(rename = "Location")]
    pub location: Option<String>,
    #[serde(rename = "ReviewBody")]
    pub review_body: Option<String>,
}

impl SubmitReviewForm {
    /// Validate the submission: both fields present and non-empty, then the
    /// location checked against the allow-list, in that order.
    pub fn validate(&self) -> Result<(), String> {
        let location = self.location.as_deref().unwrap_or("");
        let review_body = self.review_body.as_deref().unwrap_or("");

        if review_body.is_empty() || location.is_empty() {
            return Err("Missing required parameters 'ReviewBody' or 'Location'".to_string());
        }
        if !locations::is_allowed(location) {
            return Err("Invalid location".to_string());
        }
        Ok(())
    }
}

/// A review as returned by the GET listing
#[derive(Debug, Serialize)]
pub struct ReviewItem {
    #[serde(rename = "ReviewId")]
    pub review_id: String,
    #[serde(rename = "ReviewBody")]
    pub review_body: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    pub sentiment: SentimentScores,
}

/// Response for an accepted submission
#[derive(Debug, Serialize)]
pub struct SubmittedReview {
    #[serde(rename = "ReviewId")]
    pub review_id: String,
    #[serde(rename = "ReviewBody")]
    pub review_body: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Sentiment")]
    pub sentiment: SentimentScores,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub total_reviews: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
