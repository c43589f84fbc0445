use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        CreateRequestDto, RequestCreatedDto, RequestData, RequestListResponseDto,
        RequestResponseDto, UpdateStatusDto,
    },
    error::HttpError,
    handler::companies::linked_company,
    middleware::{role_check, JWTAuthMiddeware},
    models::{
        requestmodel::{AppraisalRequest, NewAppraisalRequest},
        usermodel::UserRole,
    },
    service::request_service::Actor,
    AppState,
};

pub fn requests_handler() -> Router {
    let customer = Router::new()
        .route("/", post(create_request))
        .route("/mine", get(get_my_requests))
        .route_layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Customer])
        }));

    let company = Router::new()
        .route("/company", get(get_company_requests))
        .route("/:id/accept", put(accept_request))
        .route("/:id/reject", put(reject_request))
        .route("/:id/complete", put(complete_request))
        .route_layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Company])
        }));

    let status = Router::new()
        .route("/:id/status", put(update_status))
        .route_layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Company, UserRole::Admin])
        }));

    Router::new()
        .route("/:id", get(get_request))
        .merge(customer)
        .merge(company)
        .merge(status)
}

async fn actor_for(app_state: &AppState, user: &JWTAuthMiddeware) -> Result<Actor, HttpError> {
    match user.user.role {
        UserRole::Admin => Ok(Actor::Admin),
        UserRole::Customer => Ok(Actor::Customer(user.user.id)),
        UserRole::Company => Ok(Actor::Company(linked_company(app_state, user).await?.id)),
    }
}

fn request_response(request: AppraisalRequest) -> Json<RequestResponseDto> {
    Json(RequestResponseDto {
        status: "success".to_string(),
        data: RequestData { request },
    })
}

fn list_response(requests: Vec<AppraisalRequest>) -> Json<RequestListResponseDto> {
    Json(RequestListResponseDto {
        status: "success".to_string(),
        results: requests.len(),
        requests,
    })
}

pub async fn create_request(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let company = app_state
        .company_service
        .get_company_by_id(body.company_id)
        .await?
        .filter(|c| c.is_approved)
        .ok_or_else(|| HttpError::not_found("Company not found"))?;

    if !company.offers(body.request_type) {
        return Err(HttpError::bad_request(format!(
            "{} does not offer {} appraisals",
            company.name,
            body.request_type.to_str()
        )));
    }

    let id = app_state
        .request_service
        .create_request(NewAppraisalRequest {
            customer_id: user.user.id,
            company_id: company.id,
            company_name: company.name,
            request_type: body.request_type,
            property_type: body.property_type,
            location: body.location.trim().to_string(),
            description: body.description,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RequestCreatedDto {
            status: "success".to_string(),
            id,
        }),
    ))
}

pub async fn get_my_requests(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let requests = app_state
        .request_service
        .get_customer_requests(user.user.id)
        .await?;

    Ok(list_response(requests))
}

pub async fn get_company_requests(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let company = linked_company(&app_state, &user).await?;
    let requests = app_state
        .request_service
        .get_company_requests(company.id)
        .await?;

    Ok(list_response(requests))
}

pub async fn get_request(
    Path(request_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let request = app_state
        .request_service
        .get_request_by_id(request_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Request not found"))?;

    let allowed = match actor_for(&app_state, &user).await? {
        Actor::Admin => true,
        Actor::Customer(customer_id) => request.customer_id == customer_id,
        Actor::Company(company_id) => request.company_id == company_id,
    };
    if !allowed {
        return Err(HttpError::not_found("Request not found"));
    }

    Ok(request_response(request))
}

pub async fn accept_request(
    Path(request_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let actor = actor_for(&app_state, &user).await?;
    let request = app_state
        .request_service
        .accept_request(actor, request_id)
        .await?;

    Ok(request_response(request))
}

pub async fn reject_request(
    Path(request_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let actor = actor_for(&app_state, &user).await?;
    let request = app_state
        .request_service
        .reject_request(actor, request_id)
        .await?;

    Ok(request_response(request))
}

pub async fn complete_request(
    Path(request_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let actor = actor_for(&app_state, &user).await?;
    let request = app_state
        .request_service
        .complete_request(actor, request_id)
        .await?;

    Ok(request_response(request))
}

pub async fn update_status(
    Path(request_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let actor = actor_for(&app_state, &user).await?;
    let request = app_state
        .request_service
        .transition(actor, request_id, body.status)
        .await?;

    Ok(request_response(request))
}
