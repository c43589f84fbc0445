use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::reviewmodel::{RatingSummary, Review};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRatingDto {
    #[serde(rename = "requestId")]
    pub request_id: Uuid,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(length(max = 1000, message = "Review is too long"))]
    #[serde(rename = "reviewText")]
    pub review_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewData {
    pub review: Review,
    pub summary: RatingSummary,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponseDto {
    pub status: String,
    pub data: ReviewData,
}

#[derive(Debug, Serialize)]
pub struct ReviewListResponseDto {
    pub status: String,
    pub reviews: Vec<Review>,
    pub results: usize,
}

#[derive(Debug, Serialize)]
pub struct RatedStatusDto {
    pub status: String,
    #[serde(rename = "hasRated")]
    pub has_rated: bool,
}
