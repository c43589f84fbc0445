use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{RatedStatusDto, ReviewData, ReviewResponseDto, SubmitRatingDto},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::requestmodel::RequestStatus,
    AppState,
};

pub fn reviews_handler() -> Router {
    Router::new()
        .route("/", post(submit_rating))
        .route("/status/:request_id", get(get_rated_status))
}

pub async fn submit_rating(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<SubmitRatingDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let request = app_state
        .request_service
        .get_request_by_id(body.request_id)
        .await?
        .filter(|r| r.customer_id == user.user.id)
        .ok_or_else(|| HttpError::not_found("Request not found"))?;

    if request.status != RequestStatus::Completed {
        return Err(HttpError::bad_request(
            "Only completed requests can be rated",
        ));
    }

    let (review, summary) = app_state
        .rating_service
        .submit_rating(
            request.company_id,
            user.user.id,
            request.id,
            body.rating,
            body.review_text,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReviewResponseDto {
            status: "success".to_string(),
            data: ReviewData { review, summary },
        }),
    ))
}

pub async fn get_rated_status(
    Path(request_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let has_rated = app_state
        .rating_service
        .has_rated_request(request_id, user.user.id)
        .await;

    Ok(Json(RatedStatusDto {
        status: "success".to_string(),
        has_rated,
    }))
}
