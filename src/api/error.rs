// Error-to-response mapping shared by every handler.

use crate::api::models::FieldError;
use crate::error::{IngestError, StoreError};
use crate::util::env::debug_errors;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation Error")]
    Validation(Vec<FieldError>),
    #[error("Game not found")]
    NotFound,
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    /// JSON body for this error. Internal messages are only included when
    /// `debug` is set.
    pub fn body(&self, debug: bool) -> Value {
        match self {
            ApiError::Validation(details) => json!({
                "error": "Validation Error",
                "details": details,
            }),
            ApiError::NotFound => json!({ "error": self.to_string() }),
            ApiError::Ingest(IngestError::NoData) => json!({ "error": IngestError::NoData.to_string() }),
            ApiError::Ingest(err) => json!({
                "error": if debug { err.to_string() } else { "Failed to populate games".to_string() },
            }),
            ApiError::Store(StoreError::Constraint { field, message }) => {
                let details = if debug {
                    json!([{ "field": field, "message": message }])
                } else {
                    json!("Invalid data provided")
                };
                json!({ "error": "Validation Error", "details": details })
            }
            ApiError::Store(err) => json!({
                "error": "Database Error",
                "message": if debug { err.to_string() } else { "An internal database error occurred".to_string() },
            }),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Ingest(IngestError::NoData) => StatusCode::BAD_REQUEST,
            ApiError::Ingest(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Store(StoreError::Constraint { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        HttpResponse::build(status).json(self.body(debug_errors()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_data_is_a_client_error_with_a_plain_message() {
        let err = ApiError::from(IngestError::NoData);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.body(false),
            json!({"error": "No games found in the fetched data"})
        );
    }

    #[test]
    fn ingestion_failures_hide_details_outside_debug() {
        let err = ApiError::from(IngestError::fetch("https://feeds.test/ios.json", "timed out"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body(false), json!({"error": "Failed to populate games"}));
        assert_eq!(
            err.body(true),
            json!({"error": "Failed to fetch https://feeds.test/ios.json: timed out"})
        );

        let err = ApiError::from(IngestError::Persistence(StoreError::constraint("name", "too long")));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn store_errors_follow_database_error_shape() {
        let err = ApiError::from(StoreError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.body(false),
            json!({"error": "Database Error", "message": "An internal database error occurred"})
        );
        assert!(err.body(true)["message"]
            .as_str()
            .unwrap()
            .starts_with("database error"));

        let err = ApiError::from(StoreError::constraint("name", "value longer than 255 characters"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body(false)["details"], "Invalid data provided");
        assert_eq!(err.body(true)["details"][0]["field"], "name");
    }

    #[test]
    fn validation_lists_every_field() {
        let err = ApiError::Validation(vec![
            FieldError::new("name", "Name is required"),
            FieldError::new("storeId", "StoreId is required"),
        ]);
        let body = err.body(false);
        assert_eq!(body["error"], "Validation Error");
        assert_eq!(body["details"][1]["field"], "storeId");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
