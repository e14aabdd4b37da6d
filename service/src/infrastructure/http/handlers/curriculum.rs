use axum::extract::State;
use axum::http::StatusCode;

use crate::domain::{
    AppState,
    course::{LessonId, SectionId},
    curriculum::{CreateLesson, CreateSection, LessonInput, SectionInput},
};
use crate::infrastructure::http::{
    api::{ApiError, ApiSuccess},
    extract::{Json, Path},
    handlers::dto::{LessonResponse, MessageResponse, SectionResponse},
    identity::Caller,
};

pub async fn create_section<S: AppState>(
    State(state): State<S>,
    Caller(ctx): Caller,
    Json(request): Json<CreateSection>,
) -> Result<ApiSuccess<SectionResponse>, ApiError> {
    let section = state.curriculum().create_section(&ctx, request).await?;
    Ok(ApiSuccess::new(StatusCode::CREATED, section.into()))
}

pub async fn update_section<S: AppState>(
    State(state): State<S>,
    Caller(ctx): Caller,
    Path(id): Path<SectionId>,
    Json(request): Json<SectionInput>,
) -> Result<ApiSuccess<SectionResponse>, ApiError> {
    let section = state.curriculum().update_section(&ctx, id, request).await?;
    Ok(ApiSuccess::new(StatusCode::OK, section.into()))
}

pub async fn delete_section<S: AppState>(
    State(state): State<S>,
    Caller(ctx): Caller,
    Path(id): Path<SectionId>,
) -> Result<ApiSuccess<MessageResponse>, ApiError> {
    state.curriculum().delete_section(&ctx, id).await?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageResponse::new("Section deleted successfully"),
    ))
}

pub async fn create_lesson<S: AppState>(
    State(state): State<S>,
    Caller(ctx): Caller,
    Json(request): Json<CreateLesson>,
) -> Result<ApiSuccess<LessonResponse>, ApiError> {
    let lesson = state.curriculum().create_lesson(&ctx, request).await?;
    Ok(ApiSuccess::new(StatusCode::CREATED, lesson.into()))
}

pub async fn update_lesson<S: AppState>(
    State(state): State<S>,
    Caller(ctx): Caller,
    Path(id): Path<LessonId>,
    Json(request): Json<LessonInput>,
) -> Result<ApiSuccess<LessonResponse>, ApiError> {
    let lesson = state.curriculum().update_lesson(&ctx, id, request).await?;
    Ok(ApiSuccess::new(StatusCode::OK, lesson.into()))
}

pub async fn delete_lesson<S: AppState>(
    State(state): State<S>,
    Caller(ctx): Caller,
    Path(id): Path<LessonId>,
) -> Result<ApiSuccess<MessageResponse>, ApiError> {
    state.curriculum().delete_lesson(&ctx, id).await?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageResponse::new("Lesson deleted successfully"),
    ))
}
