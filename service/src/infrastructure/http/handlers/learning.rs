use axum::extract::State;
use axum::http::StatusCode;

use crate::domain::{
    AppState,
    course::{CourseId, LessonId},
};
use crate::infrastructure::http::{
    api::{ApiError, ApiSuccess},
    extract::Path,
    handlers::dto::{EnrollmentResponse, LessonProgressResponse, ProgressResponse},
    identity::Caller,
};

pub async fn enroll<S: AppState>(
    State(state): State<S>,
    Caller(ctx): Caller,
    Path(course_id): Path<CourseId>,
) -> Result<ApiSuccess<EnrollmentResponse>, ApiError> {
    let enrollment = state.enrollments().enroll(&ctx, course_id).await?;
    Ok(ApiSuccess::new(StatusCode::OK, enrollment.into()))
}

pub async fn my_enrollments<S: AppState>(
    State(state): State<S>,
    Caller(ctx): Caller,
) -> Result<ApiSuccess<Vec<EnrollmentResponse>>, ApiError> {
    let enrollments = state.enrollments().my_enrollments(&ctx).await?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        enrollments.into_iter().map(Into::into).collect(),
    ))
}

pub async fn complete_lesson<S: AppState>(
    State(state): State<S>,
    Caller(ctx): Caller,
    Path(lesson_id): Path<LessonId>,
) -> Result<ApiSuccess<LessonProgressResponse>, ApiError> {
    let record = state.progress().complete_lesson(&ctx, lesson_id).await?;
    Ok(ApiSuccess::new(StatusCode::OK, record.into()))
}

pub async fn course_progress<S: AppState>(
    State(state): State<S>,
    Caller(ctx): Caller,
    Path(course_id): Path<CourseId>,
) -> Result<ApiSuccess<ProgressResponse>, ApiError> {
    let progress = state.progress().course_progress(&ctx, course_id).await?;
    Ok(ApiSuccess::new(StatusCode::OK, progress.into()))
}
