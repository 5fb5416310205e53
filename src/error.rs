use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Field-level validation errors, accumulated per operation.
#[derive(Debug, Default, Serialize)]
pub struct ValidationErrors {
    #[serde(flatten)]
    errors: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consume the accumulator: Ok if nothing was pushed, Err otherwise.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("The given data was invalid")]
    Validation(ValidationErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("Unauthorized")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "status": false,
                    "message": "The given data was invalid",
                    "errors": errors,
                }),
            ),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "status": false, "message": message }),
            ),
            ApiError::Unauthenticated(message) => (
                StatusCode::UNAUTHORIZED,
                json!({ "status": false, "message": message }),
            ),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                json!({ "status": false, "message": "Unauthorized" }),
            ),
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                json!({ "status": false, "message": format!("{what} not found") }),
            ),
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "status": false, "message": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_accumulate_per_field() {
        let mut errors = ValidationErrors::new();
        errors.push("title", "The title field is required.");
        errors.push("cost", "The cost must be a number.");
        errors.push("cost", "The cost must be positive.");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["title"][0], "The title field is required.");
        assert_eq!(json["cost"][1], "The cost must be positive.");
    }

    #[test]
    fn empty_accumulator_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
        let mut errors = ValidationErrors::new();
        errors.push("email", "The email field is required.");
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn error_variants_map_to_expected_statuses() {
        let mut errors = ValidationErrors::new();
        errors.push("title", "The title field is required.");
        let cases = [
            (ApiError::Validation(errors), StatusCode::UNPROCESSABLE_ENTITY),
            (ApiError::Unauthenticated("no".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden, StatusCode::FORBIDDEN),
            (ApiError::NotFound("Product"), StatusCode::NOT_FOUND),
            (
                ApiError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
