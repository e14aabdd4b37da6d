use axum::http::StatusCode;

pub mod courses;
pub mod curriculum;
mod dto;
pub mod learning;

// health check handler
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}
