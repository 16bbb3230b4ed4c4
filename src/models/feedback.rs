use serde::{Deserialize, Serialize};

use crate::constants::MAX_STAR_RATING;
use crate::routes::timestamp_to_rfc3339;

/// Feedback record stored in redb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub user_id: u64,
    pub feedback_text: String,
    pub star_rating: u8,
    /// Frontend route the feedback was sent from
    pub route: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: u64,
    pub user_id: u64,
    pub feedback_text: String,
    pub star_rating: u8,
    pub route: String,
    pub created_at: String,
}

impl Feedback {
    pub fn from_record(id: u64, record: &FeedbackRecord) -> Self {
        Self {
            id,
            user_id: record.user_id,
            feedback_text: record.feedback_text.clone(),
            star_rating: record.star_rating,
            route: record.route.clone(),
            created_at: timestamp_to_rfc3339(record.created_at),
        }
    }
}

/// Body of a feedback submission
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    pub feedback_text: String,
    pub star_rating: u8,
    #[serde(default)]
    pub route: String,
}

impl NewFeedback {
    /// Ratings run from 0 (none given) to 5 stars
    pub fn has_valid_rating(&self) -> bool {
        self.star_rating <= MAX_STAR_RATING
    }
}
