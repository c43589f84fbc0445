use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        AdminStatsResponseDto, ApprovalDto, CompanyData, CompanyListResponseDto,
        CompanyResponseDto, CreateCompanyDto, FilterUserDto, RoleUpdateDto, UserData,
        UserListResponseDto, UserResponseDto,
    },
    error::HttpError,
    models::{companymodel::Company, usermodel::User},
    AppState,
};

pub fn admin_handler() -> Router {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/companies", get(get_companies).post(create_company))
        .route("/companies/:id/approval", put(update_company_approval))
        .route("/companies/:id/suspend", put(suspend_company))
        .route("/companies/:id/archive", put(archive_company))
        .route("/users", get(get_users))
        .route("/users/:id/role", put(update_user_role))
        .route("/users/:id/disable", put(disable_user))
        .route("/requests", get(get_requests))
}

fn company_response(company: Company) -> Json<CompanyResponseDto> {
    Json(CompanyResponseDto {
        status: "success".to_string(),
        data: CompanyData { company },
    })
}

fn user_response(user: &User) -> Json<UserResponseDto> {
    Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(user),
        },
    })
}

pub async fn get_stats(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state.admin_service.get_admin_stats().await?;

    Ok(Json(AdminStatsResponseDto {
        status: "success".to_string(),
        data: stats,
    }))
}

pub async fn get_companies(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let companies = app_state.admin_service.get_all_companies().await?;

    Ok(Json(CompanyListResponseDto {
        status: "success".to_string(),
        results: companies.len(),
        companies,
    }))
}

pub async fn create_company(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateCompanyDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let company = app_state.admin_service.create_company(body.into()).await?;

    Ok((StatusCode::CREATED, company_response(company)))
}

pub async fn update_company_approval(
    Path(company_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ApprovalDto>,
) -> Result<impl IntoResponse, HttpError> {
    let company = app_state
        .admin_service
        .update_company_status(company_id, body.is_approved)
        .await?;

    Ok(company_response(company))
}

pub async fn suspend_company(
    Path(company_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let company = app_state.admin_service.suspend_company(company_id).await?;
    Ok(company_response(company))
}

pub async fn archive_company(
    Path(company_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let company = app_state.admin_service.archive_company(company_id).await?;
    Ok(company_response(company))
}

pub async fn get_users(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let users = app_state.admin_service.get_all_users().await?;

    Ok(Json(UserListResponseDto {
        status: "success".to_string(),
        results: users.len(),
        users: FilterUserDto::filter_users(&users),
    }))
}

pub async fn update_user_role(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RoleUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .admin_service
        .update_user_role(user_id, body.role)
        .await?;

    Ok(user_response(&user))
}

pub async fn disable_user(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state.admin_service.disable_user(user_id).await?;
    let dropped = app_state.auth_service.sessions().remove_for_user(user.id).await;
    tracing::info!("Dropped {} session(s) for disabled user {}", dropped, user.id);

    Ok(user_response(&user))
}

pub async fn get_requests(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let requests = app_state.request_service.get_all_requests().await?;

    Ok(Json(crate::dtos::RequestListResponseDto {
        status: "success".to_string(),
        results: requests.len(),
        requests,
    }))
}
