use axum::extract::State;
use axum::http::StatusCode;

use crate::domain::{
    AppState,
    catalog::{CourseFilter, CreateCourse, UpdateCourse},
    course::CourseId,
};
use crate::infrastructure::http::{
    api::{ApiError, ApiSuccess},
    extract::{Json, Path},
    handlers::dto::{
        CourseDetailResponse, CoursePageResponse, CourseResponse, CurriculumSectionResponse,
        MessageResponse,
    },
    identity::Caller,
    querystring::QueryString,
};

pub async fn list_published_courses<S: AppState>(
    State(state): State<S>,
    Caller(ctx): Caller,
    QueryString(filter): QueryString<CourseFilter>,
) -> Result<ApiSuccess<CoursePageResponse>, ApiError> {
    let page = state.catalog().list_courses(&ctx, filter).await?;
    Ok(ApiSuccess::new(StatusCode::OK, page.into()))
}

pub async fn course_by_slug<S: AppState>(
    State(state): State<S>,
    Caller(ctx): Caller,
    Path(slug): Path<String>,
) -> Result<ApiSuccess<CourseDetailResponse>, ApiError> {
    let detail = state.catalog().course_by_slug(&ctx, &slug).await?;
    Ok(ApiSuccess::new(StatusCode::OK, detail.into()))
}

pub async fn list_all_courses<S: AppState>(
    State(state): State<S>,
    Caller(ctx): Caller,
    QueryString(filter): QueryString<CourseFilter>,
) -> Result<ApiSuccess<CoursePageResponse>, ApiError> {
    let page = state.catalog().list_all_courses(&ctx, filter).await?;
    Ok(ApiSuccess::new(StatusCode::OK, page.into()))
}

pub async fn course_by_id<S: AppState>(
    State(state): State<S>,
    Caller(ctx): Caller,
    Path(id): Path<CourseId>,
) -> Result<ApiSuccess<CourseDetailResponse>, ApiError> {
    let detail = state.catalog().course_by_id(&ctx, id).await?;
    Ok(ApiSuccess::new(StatusCode::OK, detail.into()))
}

pub async fn create_course<S: AppState>(
    State(state): State<S>,
    Caller(ctx): Caller,
    Json(request): Json<CreateCourse>,
) -> Result<ApiSuccess<CourseResponse>, ApiError> {
    state
        .catalog()
        .create_course(&ctx, request)
        .await
        .map_err(ApiError::from)
        .map(|course| ApiSuccess::new(StatusCode::CREATED, course.into()))
}

pub async fn update_course<S: AppState>(
    State(state): State<S>,
    Caller(ctx): Caller,
    Path(id): Path<CourseId>,
    Json(request): Json<UpdateCourse>,
) -> Result<ApiSuccess<CourseResponse>, ApiError> {
    state
        .catalog()
        .update_course(&ctx, id, request)
        .await
        .map_err(ApiError::from)
        .map(|course| ApiSuccess::new(StatusCode::OK, course.into()))
}

pub async fn delete_course<S: AppState>(
    State(state): State<S>,
    Caller(ctx): Caller,
    Path(id): Path<CourseId>,
) -> Result<ApiSuccess<MessageResponse>, ApiError> {
    state.catalog().delete_course(&ctx, id).await?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageResponse::new("Course deleted successfully"),
    ))
}

pub async fn course_curriculum<S: AppState>(
    State(state): State<S>,
    Caller(ctx): Caller,
    Path(id): Path<CourseId>,
) -> Result<ApiSuccess<Vec<CurriculumSectionResponse>>, ApiError> {
    let sections = state.curriculum().curriculum(&ctx, id).await?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        sections.into_iter().map(Into::into).collect(),
    ))
}
