use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    companymodel::AppraisalType,
    requestmodel::{AppraisalRequest, RequestStatus},
};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateRequestDto {
    #[serde(rename = "companyId")]
    pub company_id: Uuid,

    #[serde(rename = "type")]
    pub request_type: AppraisalType,

    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,

    #[serde(rename = "propertyType")]
    pub property_type: Option<String>,

    #[validate(length(max = 2000, message = "Description is too long"))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusDto {
    pub status: RequestStatus,
}

#[derive(Debug, Serialize)]
pub struct RequestCreatedDto {
    pub status: String,
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RequestData {
    pub request: AppraisalRequest,
}

#[derive(Debug, Serialize)]
pub struct RequestResponseDto {
    pub status: String,
    pub data: RequestData,
}

#[derive(Debug, Serialize)]
pub struct RequestListResponseDto {
    pub status: String,
    pub requests: Vec<AppraisalRequest>,
    pub results: usize,
}
