use crate::models::ErrorResponse;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::collections::BTreeMap;
use thiserror::Error;

/// Field-level validation failure collected before scoring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationFailure {
    /// Wire names of the failing fields, sorted
    pub missing_fields: Vec<String>,
    /// Wire name -> first message for that field
    pub errors: BTreeMap<String, String>,
}

impl ValidationFailure {
    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), message.to_string());
        Self {
            missing_fields: vec![field.to_string()],
            errors,
        }
    }
}

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Validation error: {} field(s) failed", .0.missing_fields.len())]
    Validation(ValidationFailure),

    #[error("Invalid category tag: {0}")]
    InvalidCategoryTag(#[from] risk_engine::Error),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntakeError {
    fn code(&self) -> &'static str {
        match self {
            IntakeError::Validation(_) => "VALIDATION_ERROR",
            IntakeError::InvalidCategoryTag(_) => "INVALID_CATEGORY_TAG",
            IntakeError::InvalidSignature(_) => "INVALID_SIGNATURE",
            IntakeError::MalformedRequest(_) => "MALFORMED_REQUEST",
            IntakeError::Storage(_) | IntakeError::Io(_) => "STORAGE_ERROR",
            IntakeError::Configuration(_) => "CONFIGURATION_ERROR",
            IntakeError::Serialization(_) | IntakeError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for IntakeError {
    fn status_code(&self) -> StatusCode {
        match self {
            IntakeError::Validation(_)
            | IntakeError::InvalidCategoryTag(_)
            | IntakeError::InvalidSignature(_)
            | IntakeError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            IntakeError::Storage(_)
            | IntakeError::Io(_)
            | IntakeError::Serialization(_)
            | IntakeError::Configuration(_)
            | IntakeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (missing_fields, errors) = match self {
            IntakeError::Validation(failure) => {
                (failure.missing_fields.clone(), failure.errors.clone())
            }
            IntakeError::InvalidCategoryTag(risk_engine::Error::InvalidCategoryTag {
                field,
                ..
            }) => {
                let failure = ValidationFailure::single(field, &self.to_string());
                (failure.missing_fields, failure.errors)
            }
            _ => (Vec::new(), BTreeMap::new()),
        };

        // Storage internals stay in the logs
        let message = match self {
            IntakeError::Storage(_) | IntakeError::Io(_) => {
                "Submission could not be stored".to_string()
            }
            _ => self.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            success: false,
            error: self.code().to_string(),
            message,
            missing_fields,
            errors,
        })
    }
}

pub type IntakeResult<T> = Result<T, IntakeError>;
