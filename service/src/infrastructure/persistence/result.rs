use chrono::{DateTime, Utc};
use lectern_common::{
    COURSE_ID_FIELD_NAME, CREATED_FIELD_NAME, ID_FIELD_NAME, LESSON_ID_FIELD_NAME,
    ORDER_INDEX_FIELD_NAME, SECTION_ID_FIELD_NAME, SLUG_FIELD_NAME, Slug, UPDATED_FIELD_NAME,
    USER_ID_FIELD_NAME,
};
use sqlx::{Postgres, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    domain::{
        course::{
            Course, CourseId, CourseLevel, CourseOverview, CourseStatus, EnrolledCourse,
            Enrollment, EnrollmentId, Lesson, LessonId, LessonProgress, LessonProgressId,
            Progress, Section, SectionId, Title, UserId,
        },
        repository::RepositoryError,
    },
    infrastructure::persistence::columns::{
        COMPLETED, COMPLETED_AT, CONTENT, COURSE_LEVEL, COURSE_SLUG, COURSE_THUMBNAIL,
        COURSE_TITLE, DESCRIPTION, ENROLLED_AT, INSTRUCTOR_ID, IS_FREE, IS_PREVIEW,
        LAST_WATCHED_AT, LEVEL, PRICE, PROGRESS, STATUS, THUMBNAIL, TITLE, TOTAL_DURATION,
        TOTAL_LESSONS, VIDEO_DURATION, VIDEO_URL, WATCH_DURATION,
    },
};

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column).map_err(|e| {
        RepositoryError::DatabaseError(format!("Failed to parse {}: {}", column, e))
    })
}

fn corrupt(column: &str, e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::DatabaseError(format!("Invalid value in {}: {}", column, e))
}

fn title(row: &PgRow, column: &str) -> Result<Title, RepositoryError> {
    Title::try_new(get::<String>(row, column)?).map_err(|e| corrupt(column, e))
}

fn slug(row: &PgRow, column: &str) -> Result<Slug, RepositoryError> {
    Slug::try_new(get::<String>(row, column)?).map_err(|e| corrupt(column, e))
}

fn level(row: &PgRow, column: &str) -> Result<CourseLevel, RepositoryError> {
    get::<String>(row, column)?
        .parse()
        .map_err(|e| corrupt(column, e))
}

pub fn row_to_course(row: &PgRow) -> Result<Course, RepositoryError> {
    let status: CourseStatus = get::<String>(row, STATUS)?
        .parse()
        .map_err(|e| corrupt(STATUS, e))?;

    Ok(Course {
        id: CourseId(get::<Uuid>(row, ID_FIELD_NAME)?),
        title: title(row, TITLE)?,
        slug: slug(row, SLUG_FIELD_NAME)?,
        description: get(row, DESCRIPTION)?,
        thumbnail: get(row, THUMBNAIL)?,
        price: get(row, PRICE)?,
        is_free: get(row, IS_FREE)?,
        level: level(row, LEVEL)?,
        status,
        instructor_id: UserId::new(get::<String>(row, INSTRUCTOR_ID)?),
        created_at: get(row, CREATED_FIELD_NAME)?,
        updated_at: get(row, UPDATED_FIELD_NAME)?,
    })
}

pub fn row_to_overview(row: &PgRow) -> Result<CourseOverview, RepositoryError> {
    let total_lessons: i64 = get(row, TOTAL_LESSONS)?;
    let total_duration: i64 = get(row, TOTAL_DURATION)?;

    Ok(CourseOverview {
        course: row_to_course(row)?,
        total_lessons: u32::try_from(total_lessons).map_err(|e| corrupt(TOTAL_LESSONS, e))?,
        total_duration: u64::try_from(total_duration).map_err(|e| corrupt(TOTAL_DURATION, e))?,
    })
}

pub fn row_to_section(row: &PgRow) -> Result<Section, RepositoryError> {
    Ok(Section {
        id: SectionId(get(row, ID_FIELD_NAME)?),
        course_id: CourseId(get(row, COURSE_ID_FIELD_NAME)?),
        title: title(row, TITLE)?,
        description: get(row, DESCRIPTION)?,
        order_index: get(row, ORDER_INDEX_FIELD_NAME)?,
        created_at: get(row, CREATED_FIELD_NAME)?,
        updated_at: get(row, UPDATED_FIELD_NAME)?,
    })
}

pub fn row_to_lesson(row: &PgRow) -> Result<Lesson, RepositoryError> {
    Ok(Lesson {
        id: LessonId(get(row, ID_FIELD_NAME)?),
        section_id: SectionId(get(row, SECTION_ID_FIELD_NAME)?),
        title: title(row, TITLE)?,
        description: get(row, DESCRIPTION)?,
        content: get(row, CONTENT)?,
        video_url: get(row, VIDEO_URL)?,
        video_duration: get(row, VIDEO_DURATION)?,
        order_index: get(row, ORDER_INDEX_FIELD_NAME)?,
        is_preview: get(row, IS_PREVIEW)?,
        created_at: get(row, CREATED_FIELD_NAME)?,
        updated_at: get(row, UPDATED_FIELD_NAME)?,
    })
}

pub fn row_to_enrollment(row: &PgRow) -> Result<Enrollment, RepositoryError> {
    let completed_at: Option<DateTime<Utc>> = get(row, COMPLETED_AT)?;

    Ok(Enrollment {
        id: EnrollmentId(get(row, ID_FIELD_NAME)?),
        user_id: UserId::new(get::<String>(row, USER_ID_FIELD_NAME)?),
        course_id: CourseId(get(row, COURSE_ID_FIELD_NAME)?),
        enrolled_at: get(row, ENROLLED_AT)?,
        completed_at,
        progress: Progress::from_stored(get(row, PROGRESS)?),
        course: None,
    })
}

/// Enrollment joined with the summary columns of its course.
pub fn row_to_listed_enrollment(row: &PgRow) -> Result<Enrollment, RepositoryError> {
    let mut enrollment = row_to_enrollment(row)?;
    enrollment.course = Some(EnrolledCourse {
        title: title(row, COURSE_TITLE)?,
        slug: slug(row, COURSE_SLUG)?,
        thumbnail: get(row, COURSE_THUMBNAIL)?,
        level: level(row, COURSE_LEVEL)?,
    });
    Ok(enrollment)
}

pub fn row_to_lesson_progress(row: &PgRow) -> Result<LessonProgress, RepositoryError> {
    Ok(LessonProgress {
        id: LessonProgressId(get(row, ID_FIELD_NAME)?),
        user_id: UserId::new(get::<String>(row, USER_ID_FIELD_NAME)?),
        lesson_id: LessonId(get(row, LESSON_ID_FIELD_NAME)?),
        completed: get(row, COMPLETED)?,
        completed_at: get(row, COMPLETED_AT)?,
        watch_duration: get(row, WATCH_DURATION)?,
        last_watched_at: get(row, LAST_WATCHED_AT)?,
    })
}
