use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::error::{CourseError, ErrorKind};

// ApiSuccess is a wrapper around a response that includes a status code.

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize>(StatusCode, Json<ApiResponseBody<T>>);

impl<T: Serialize> ApiSuccess<T> {
    pub(crate) fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

// ApiError is a wrapper around a response that includes a status code.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    ServiceUnavailable(String),
    GatewayTimeout(String),
}

impl From<CourseError> for ApiError {
    fn from(e: CourseError) -> Self {
        let message = e.to_string();
        match e.kind() {
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Conflict | ErrorKind::InvalidState => Self::BadRequest(message),
            ErrorKind::Unauthenticated => Self::Unauthorized(message),
            ErrorKind::Forbidden => Self::Forbidden(message),
            ErrorKind::Timeout => Self::GatewayTimeout(message),
            ErrorKind::Cancelled => Self::ServiceUnavailable(message),
            ErrorKind::Internal => {
                let cause = std::error::Error::source(&e)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                Self::InternalServerError(format!("{}: {}", message, cause))
            }
        }
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        use ApiError::*;

        match self {
            InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BadRequest(_) => StatusCode::BAD_REQUEST,
            Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Forbidden(_) => StatusCode::FORBIDDEN,
            NotFound(_) => StatusCode::NOT_FOUND,
            ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use ApiError::*;

        let status = self.status_code();
        let message = match self {
            InternalServerError(e) => {
                tracing::error!("{}", e);
                "Internal server error".to_string()
            }
            BadRequest(message)
            | Unauthorized(message)
            | Forbidden(message)
            | NotFound(message)
            | ServiceUnavailable(message)
            | GatewayTimeout(message) => message,
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

// Generic response structure shared by all API responses.

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize> {
    pub status_code: u16,
    pub data: T,
}

impl<T: Serialize> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

/// The response data format for all error responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::RepositoryError;

    #[test]
    fn domain_errors_map_to_status_codes() {
        let cases = [
            (CourseError::LessonNotFound, StatusCode::NOT_FOUND),
            (CourseError::AlreadyEnrolled, StatusCode::BAD_REQUEST),
            (CourseError::PaymentRequired, StatusCode::BAD_REQUEST),
            (CourseError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (CourseError::Forbidden, StatusCode::FORBIDDEN),
            (
                CourseError::Timeout {
                    operation: "list courses",
                },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                CourseError::Cancelled {
                    operation: "list courses",
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status_code(), status);
        }
    }

    #[test]
    fn store_failures_keep_detail_out_of_the_message() {
        let error = ApiError::from(CourseError::Store {
            operation: "create course",
            source: RepositoryError::DatabaseError("connection reset".to_string()),
        });

        assert_eq!(
            error,
            ApiError::InternalServerError(
                "create course failed: database error: connection reset".to_string()
            )
        );
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
