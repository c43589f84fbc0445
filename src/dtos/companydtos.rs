use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::companymodel::{AppraisalType, Company, CompanyProfileUpdate};

pub fn validate_services(services: &Vec<AppraisalType>) -> Result<(), ValidationError> {
    if services.is_empty() {
        return Err(ValidationError::new("At least one service is required"));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let phone_regex = regex::Regex::new(r"^\+?[0-9][0-9 -]{5,18}[0-9]$")
        .map_err(|_| ValidationError::new("Invalid phone regex"))?;

    if !phone_regex.is_match(phone.trim()) {
        let mut error = ValidationError::new("invalid_phone");
        error.message = Some(Cow::from(
            "Phone number must contain 7 to 20 digits, spaces or dashes",
        ));
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
pub struct CompanyQueryDto {
    pub service: Option<AppraisalType>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateCompanyDto {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,

    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,

    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,

    #[validate(length(min = 1, message = "Location cannot be empty"))]
    pub location: Option<String>,

    #[validate(length(max = 2000, message = "Description is too long"))]
    pub description: Option<String>,
}

impl From<UpdateCompanyDto> for CompanyProfileUpdate {
    fn from(dto: UpdateCompanyDto) -> Self {
        CompanyProfileUpdate {
            name: dto.name.map(|n| n.trim().to_string()),
            phone: dto.phone,
            email: dto.email.map(|e| e.trim().to_lowercase()),
            location: dto.location,
            description: dto.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompanyData {
    pub company: Company,
}

#[derive(Debug, Serialize)]
pub struct CompanyResponseDto {
    pub status: String,
    pub data: CompanyData,
}

#[derive(Debug, Serialize)]
pub struct CompanyListResponseDto {
    pub status: String,
    pub companies: Vec<Company>,
    pub results: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_numbers_are_checked_when_present() {
        assert!(validate_phone("+966 55 123 4567").is_ok());
        assert!(validate_phone("011-456-7890").is_ok());
        assert!(validate_phone("12ab").is_err());

        let update = UpdateCompanyDto {
            phone: Some("call me".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
        assert!(UpdateCompanyDto::default().validate().is_ok());
    }
}
