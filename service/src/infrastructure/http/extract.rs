use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts};

use crate::infrastructure::http::api::ApiError;

/// Path parameters whose rejections use the API error envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);

/// JSON request body whose rejections use the API error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;

    use crate::domain::catalog::CreateCourse;

    #[tokio::test]
    async fn malformed_body_becomes_bad_request() {
        let request = Request::builder()
            .header("content-type", "application/json")
            .body(Body::from("{\"title\": "))
            .unwrap();

        let error = Json::<CreateCourse>::from_request(request, &())
            .await
            .unwrap_err();

        assert!(matches!(error, ApiError::BadRequest(_)));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_content_type_is_reported() {
        let request = Request::builder()
            .body(Body::from("{\"title\": \"Rust\"}"))
            .unwrap();

        let error = Json::<CreateCourse>::from_request(request, &())
            .await
            .unwrap_err();

        let ApiError::BadRequest(message) = error else {
            panic!("expected a bad request, got {:?}", error);
        };
        assert!(message.contains("Content-Type"));
    }
}
