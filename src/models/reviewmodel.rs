use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Review {
    pub id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub request_id: Uuid,
    pub rating: i32,
    pub review_text: Option<String>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub company_id: Uuid,
    pub company_name: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub request_id: Uuid,
    pub rating: i32,
    pub review_text: Option<String>,
}

/// Aggregate written back onto the company after every new review.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub rating: f64,
    pub total_ratings: i32,
}

impl RatingSummary {
    pub fn from_ratings(ratings: &[i32]) -> Self {
        if ratings.is_empty() {
            return RatingSummary {
                rating: 0.0,
                total_ratings: 0,
            };
        }

        let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
        let mean = sum as f64 / ratings.len() as f64;

        RatingSummary {
            rating: round_to_tenth(mean),
            total_ratings: ratings.len() as i32,
        }
    }
}

pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
