use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    middleware,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        CompanyData, CompanyListResponseDto, CompanyQueryDto, CompanyResponseDto,
        ReviewListResponseDto, UpdateCompanyDto,
    },
    error::HttpError,
    middleware::{auth, JWTAuthMiddeware},
    models::{companymodel::Company, usermodel::UserRole},
    AppState,
};

pub fn companies_handler() -> Router {
    let protected = Router::new()
        .route("/me", get(get_my_company))
        .route("/:id", axum::routing::put(update_company))
        .route_layer(middleware::from_fn(auth));

    Router::new()
        .route("/", get(get_companies))
        .route("/:id", get(get_company))
        .route("/:id/reviews", get(get_company_reviews))
        .merge(protected)
}

/// The company a `company` account signs in for.
pub(crate) async fn linked_company(
    app_state: &AppState,
    user: &JWTAuthMiddeware,
) -> Result<Company, HttpError> {
    if user.user.role != UserRole::Company {
        return Err(HttpError::forbidden("Only company accounts can do this"));
    }

    app_state
        .company_service
        .get_company_by_user_id(user.user.id)
        .await?
        .ok_or_else(|| HttpError::forbidden("No company is linked to this account"))
}

pub async fn get_companies(
    Query(query): Query<CompanyQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let companies = match query.service {
        Some(service) => {
            app_state
                .company_service
                .get_companies_by_service(service)
                .await?
        }
        None => app_state.company_service.get_approved_companies().await?,
    };

    Ok(Json(CompanyListResponseDto {
        status: "success".to_string(),
        results: companies.len(),
        companies,
    }))
}

pub async fn get_company(
    Path(company_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let company = app_state
        .company_service
        .get_company_by_id(company_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Company not found"))?;

    Ok(Json(CompanyResponseDto {
        status: "success".to_string(),
        data: CompanyData { company },
    }))
}

pub async fn get_company_reviews(
    Path(company_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let reviews = app_state
        .rating_service
        .get_company_reviews(company_id)
        .await?;

    Ok(Json(ReviewListResponseDto {
        status: "success".to_string(),
        results: reviews.len(),
        reviews,
    }))
}

pub async fn get_my_company(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let company = linked_company(&app_state, &user).await?;

    Ok(Json(CompanyResponseDto {
        status: "success".to_string(),
        data: CompanyData { company },
    }))
}

pub async fn update_company(
    Path(company_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateCompanyDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    if user.user.role != UserRole::Admin {
        let company = linked_company(&app_state, &user).await?;
        if company.id != company_id {
            return Err(HttpError::forbidden("You can only update your own company"));
        }
    }

    let company = app_state
        .company_service
        .update_company(company_id, body.into())
        .await?;

    Ok(Json(CompanyResponseDto {
        status: "success".to_string(),
        data: CompanyData { company },
    }))
}
