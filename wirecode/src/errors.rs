use crate::db::errors::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// One or more required request fields are absent or empty
    #[error("Missing required fields: {}", fields.join(", "))]
    MissingFields { fields: Vec<String> },

    /// Caller identity required but not provided
    #[error("Not authenticated")]
    Unauthenticated,

    /// Caller identity does not own the target record
    #[error("Not permitted to modify {resource}")]
    Forbidden { resource: String },

    /// Requested resource not found
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// A record with the same public handle already exists
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Debit would take the credit balance below zero
    #[error("Insufficient credits")]
    InsufficientCredits,

    /// Model name is not in the known catalog
    #[error("Invalid AI model: {model}")]
    InvalidModel { model: String },

    /// Code payload missing or empty on save
    #[error("{message}")]
    InvalidPayload { message: String },

    /// Rate limit exceeded for a logical action key
    #[error("{message}")]
    TooManyRequests { message: String },

    /// A dependency (AI service, object storage, identity provider) failed
    #[error("{service} service error: {message}")]
    Upstream { service: String, message: String },

    /// Database write failure after a side effect already happened.
    ///
    /// Surfaced distinctly from generation failure so the caller knows the
    /// content exists but was not durably saved.
    #[error("Failed to persist {operation}")]
    Persistence {
        operation: String,
        #[source]
        source: DbError,
    },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingFields { .. } => StatusCode::BAD_REQUEST,
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::InsufficientCredits => StatusCode::PAYMENT_REQUIRED,
            Error::InvalidModel { .. } => StatusCode::BAD_REQUEST,
            Error::InvalidPayload { .. } => StatusCode::BAD_REQUEST,
            Error::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            Error::Upstream { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable kind carried in every error response body.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MissingFields { .. } => "missing_fields",
            Error::Unauthenticated => "unauthenticated",
            Error::Forbidden { .. } => "forbidden",
            Error::NotFound { .. } => "not_found",
            Error::Conflict { .. } => "conflict",
            Error::InsufficientCredits => "insufficient_credits",
            Error::InvalidModel { .. } => "invalid_model",
            Error::InvalidPayload { .. } => "invalid_payload",
            Error::TooManyRequests { .. } => "rate_limited",
            Error::Upstream { .. } => "upstream_service_error",
            Error::Persistence { .. } => "persistence_error",
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "not_found",
                DbError::UniqueViolation { .. } => "conflict",
                DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => "bad_request",
                DbError::Other(_) => "internal",
            },
            Error::Other(_) => "internal",
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::MissingFields { fields } => format!("Missing required fields: {}", fields.join(", ")),
            Error::Unauthenticated => "Authentication required".to_string(),
            Error::Forbidden { resource } => format!("You do not have permission to modify this {resource}"),
            Error::NotFound { resource, id } => format!("{resource} not found: {id}"),
            Error::Conflict { message } => message.clone(),
            Error::InsufficientCredits => "Insufficient credits. Please purchase more credits to continue.".to_string(),
            Error::InvalidModel { model } => format!("Invalid AI model: {model}"),
            Error::InvalidPayload { message } => message.clone(),
            Error::TooManyRequests { message } => message.clone(),
            Error::Upstream { service, .. } => {
                format!("The {service} service is currently unavailable. Please try again.")
            }
            Error::Persistence { operation, .. } => {
                format!("Generation succeeded but saving the {operation} failed. The content is still available; retry the save.")
            }
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { .. } => "Resource already exists".to_string(),
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(err) => {
                // Detailed messages in development builds only
                if cfg!(debug_assertions) {
                    format!("{err:#}")
                } else {
                    "Something went wrong".to_string()
                }
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Persistence { .. } | Error::Upstream { .. } => {
                tracing::error!("Dependency error: {:#}", self);
            }
            Error::Database(_) | Error::Conflict { .. } => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated | Error::Forbidden { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            _ => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = json!({
            "error": self.user_message(),
            "kind": self.kind(),
            "status": status.as_u16(),
        });

        (status, axum::response::Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
