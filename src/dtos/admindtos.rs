use serde::{Deserialize, Serialize};
use validator::Validate;

use super::companydtos::{validate_phone, validate_services};
use crate::{
    models::companymodel::AppraisalType,
    service::admin_service::{AdminStats, CreateCompanyInput},
};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateCompanyDto {
    #[validate(length(min = 1, message = "Company name is required"))]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(custom = "validate_phone")]
    pub phone: String,

    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,

    #[validate(custom = "validate_services")]
    pub services: Vec<AppraisalType>,

    #[validate(length(min = 1, message = "License number is required"))]
    #[serde(rename = "licenseNumber")]
    pub license_number: String,

    pub description: Option<String>,

    #[validate(
        length(min = 1, message = "Password is required"),
        length(max = 64, message = "Password must not be more than 64 characters")
    )]
    pub password: String,
}

impl From<CreateCompanyDto> for CreateCompanyInput {
    fn from(dto: CreateCompanyDto) -> Self {
        CreateCompanyInput {
            name: dto.name,
            email: dto.email,
            phone: dto.phone,
            location: dto.location,
            services: dto.services,
            license_number: dto.license_number,
            description: dto.description,
            password: dto.password,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalDto {
    #[serde(rename = "isApproved")]
    pub is_approved: bool,
}

#[derive(Debug, Serialize)]
pub struct AdminStatsResponseDto {
    pub status: String,
    pub data: AdminStats,
}
