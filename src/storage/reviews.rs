use chrono::NaiveDateTime;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::locations;

/// Timestamp format used by the review data and by submission responses.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors raised while loading the review collection.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open review data at {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse review record")]
    Parse(#[from] csv::Error),
}

/// One customer review as loaded from the tabular source.
///
/// The timestamp is kept verbatim; malformed values survive loading and are
/// simply never matched by date bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    #[serde(rename = "ReviewId", default)]
    pub review_id: String,
    #[serde(rename = "ReviewBody", default)]
    pub review_body: String,
    #[serde(rename = "Location", default)]
    pub location: String,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: String,
}

impl Review {
    /// Parsed timestamp, or `None` when the stored value is malformed.
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }
}

/// Validated location and date bounds for a store scan.
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub location: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

/// In-memory review collection, loaded once at startup and read-only after.
pub struct ReviewStore {
    reviews: Vec<Review>,
}

impl ReviewStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Read reviews from any CSV source. Rows without a `ReviewId` get a
    /// fresh UUID so every surfaced review carries a stable identifier.
    pub fn from_reader(reader: impl Read) -> Result<Self, StoreError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut reviews = Vec::new();

        for record in csv_reader.deserialize() {
            let mut review: Review = record?;
            if review.review_id.is_empty() {
                review.review_id = Uuid::new_v4().to_string();
            }
            reviews.push(review);
        }

        Ok(Self { reviews })
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    /// Linear scan applying the location and date-range rules.
    ///
    /// A location filter only ever matches reviews whose location is in the
    /// allow-list, and reviews with malformed timestamps pass every date
    /// bound. Store order is preserved.
    pub fn select(&self, filter: &ReviewFilter) -> Vec<&Review> {
        self.reviews
            .iter()
            .filter(|review| {
                if let Some(location) = &filter.location {
                    if !locations::is_allowed(&review.location) {
                        return false;
                    }
                    if review.location != *location {
                        return false;
                    }
                }

                if let Some(timestamp) = review.parsed_timestamp() {
                    if filter.start.is_some_and(|start| timestamp < start) {
                        return false;
                    }
                    if filter.end.is_some_and(|end| timestamp > end) {
                        return false;
                    }
                }

                true
            })
            .collect()
    }
}
