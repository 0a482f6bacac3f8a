use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use database::services::ServiceError;
use log::{error, warn};
use thiserror::Error;

use crate::response::ApiEnvelope;

/// The API error taxonomy. The mapping from error to HTTP status and
/// envelope lives here, once, instead of being repeated per handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(db_err) => {
                error!("database error: {db_err}");
                Self::Internal
            }
            ServiceError::UserNotFound
            | ServiceError::CategoryNotFound
            | ServiceError::ClassNotFound
            | ServiceError::ScheduleNotFound
            | ServiceError::BookingNotFound => Self::NotFound(err.to_string()),
            ServiceError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            ServiceError::AccountDisabled => Self::Forbidden(err.to_string()),
            ServiceError::EmailTaken
            | ServiceError::NotAnInstructor
            | ServiceError::ScheduleNotBookable
            | ServiceError::SessionInPast
            | ServiceError::DuplicateBooking
            | ServiceError::SessionFull
            | ServiceError::AlreadyCancelled
            | ServiceError::BookingCompleted
            | ServiceError::CancellationWindowPassed(_)
            | ServiceError::ReviewNotEligible
            | ServiceError::DuplicateReview
            | ServiceError::Invalid(_) => Self::Validation(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (message, detail) = match &self {
            Self::Validation(detail) => ("Validation error", detail.clone()),
            Self::Unauthorized(detail) => ("Unauthorized", detail.clone()),
            Self::Forbidden(detail) => ("Forbidden", detail.clone()),
            Self::NotFound(detail) => ("Not found", detail.clone()),
            Self::Internal => (
                "Internal server error",
                "An unexpected error occurred. Please try again later.".to_string(),
            ),
        };

        if status.is_client_error() {
            warn!("{} - {detail}", status.as_u16());
        }

        (status, ApiEnvelope::failure(message, &detail)).into_response()
    }
}

#[cfg(test)]
mod test {
    use super::ApiError;
    use axum::http::StatusCode;
    use database::services::ServiceError;

    #[test]
    fn test_service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::ScheduleNotFound, StatusCode::NOT_FOUND),
            (ServiceError::BookingNotFound, StatusCode::NOT_FOUND),
            (ServiceError::DuplicateBooking, StatusCode::BAD_REQUEST),
            (ServiceError::SessionFull, StatusCode::BAD_REQUEST),
            (
                ServiceError::CancellationWindowPassed(24),
                StatusCode::BAD_REQUEST,
            ),
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::AccountDisabled, StatusCode::FORBIDDEN),
            (ServiceError::ReviewNotEligible, StatusCode::BAD_REQUEST),
        ];

        for (service_error, expected) in cases {
            let api_error: ApiError = service_error.into();
            assert_eq!(api_error.status_code(), expected);
        }
    }

    #[test]
    fn test_database_errors_stay_generic() {
        let api_error: ApiError =
            ServiceError::Database(sea_orm::DbErr::Custom("pool exhausted".to_string())).into();

        assert_eq!(
            api_error.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        // the persistence detail must not leak into the message
        assert_eq!(api_error.to_string(), "internal server error");
    }
}
