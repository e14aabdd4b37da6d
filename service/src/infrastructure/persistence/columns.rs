use lectern_common::{
    COMPLETED_AT_FIELD_NAME, COMPLETED_FIELD_NAME, CONTENT_FIELD_NAME, COURSE_ID_FIELD_NAME,
    COURSES_TABLE, CREATED_FIELD_NAME, DESCRIPTION_FIELD_NAME, ENROLLED_AT_FIELD_NAME,
    ENROLLMENTS_TABLE, ID_FIELD_NAME, INSTRUCTOR_ID_FIELD_NAME, IS_FREE_FIELD_NAME,
    IS_PREVIEW_FIELD_NAME, LAST_WATCHED_AT_FIELD_NAME, LESSON_ID_FIELD_NAME, LESSON_PROGRESS_TABLE,
    LESSONS_TABLE, LEVEL_FIELD_NAME, ORDER_INDEX_FIELD_NAME, PRICE_FIELD_NAME, PROGRESS_FIELD_NAME,
    SECTION_ID_FIELD_NAME, SECTIONS_TABLE, SLUG_FIELD_NAME, STATUS_FIELD_NAME, THUMBNAIL_FIELD_NAME,
    TITLE_FIELD_NAME, UPDATED_FIELD_NAME, USER_ID_FIELD_NAME, VIDEO_DURATION_FIELD_NAME,
    VIDEO_URL_FIELD_NAME, WATCH_DURATION_FIELD_NAME,
};

use crate::infrastructure::persistence::schema::Table;

pub const COURSES: Table<'static> = Table::new(COURSES_TABLE, "c");
pub const SECTIONS: Table<'static> = Table::new(SECTIONS_TABLE, "s");
pub const LESSONS: Table<'static> = Table::new(LESSONS_TABLE, "l");
pub const ENROLLMENTS: Table<'static> = Table::new(ENROLLMENTS_TABLE, "e");
pub const LESSON_PROGRESS: Table<'static> = Table::new(LESSON_PROGRESS_TABLE, "p");

pub const TITLE: &str = TITLE_FIELD_NAME;
pub const DESCRIPTION: &str = DESCRIPTION_FIELD_NAME;
pub const THUMBNAIL: &str = THUMBNAIL_FIELD_NAME;
pub const PRICE: &str = PRICE_FIELD_NAME;
pub const IS_FREE: &str = IS_FREE_FIELD_NAME;
pub const LEVEL: &str = LEVEL_FIELD_NAME;
pub const STATUS: &str = STATUS_FIELD_NAME;
pub const INSTRUCTOR_ID: &str = INSTRUCTOR_ID_FIELD_NAME;
pub const CONTENT: &str = CONTENT_FIELD_NAME;
pub const VIDEO_URL: &str = VIDEO_URL_FIELD_NAME;
pub const VIDEO_DURATION: &str = VIDEO_DURATION_FIELD_NAME;
pub const IS_PREVIEW: &str = IS_PREVIEW_FIELD_NAME;
pub const ENROLLED_AT: &str = ENROLLED_AT_FIELD_NAME;
pub const COMPLETED_AT: &str = COMPLETED_AT_FIELD_NAME;
pub const PROGRESS: &str = PROGRESS_FIELD_NAME;
pub const COMPLETED: &str = COMPLETED_FIELD_NAME;
pub const WATCH_DURATION: &str = WATCH_DURATION_FIELD_NAME;
pub const LAST_WATCHED_AT: &str = LAST_WATCHED_AT_FIELD_NAME;

// aliases of derived values
pub const TOTAL_LESSONS: &str = "total_lessons";
pub const TOTAL_DURATION: &str = "total_duration";
pub const COURSE_TITLE: &str = "course_title";
pub const COURSE_SLUG: &str = "course_slug";
pub const COURSE_THUMBNAIL: &str = "course_thumbnail";
pub const COURSE_LEVEL: &str = "course_level";

pub const COURSE_COLUMNS: [&str; 12] = [
    ID_FIELD_NAME,
    TITLE,
    SLUG_FIELD_NAME,
    DESCRIPTION,
    THUMBNAIL,
    PRICE,
    IS_FREE,
    LEVEL,
    STATUS,
    INSTRUCTOR_ID,
    CREATED_FIELD_NAME,
    UPDATED_FIELD_NAME,
];

pub const SECTION_COLUMNS: [&str; 7] = [
    ID_FIELD_NAME,
    COURSE_ID_FIELD_NAME,
    TITLE,
    DESCRIPTION,
    ORDER_INDEX_FIELD_NAME,
    CREATED_FIELD_NAME,
    UPDATED_FIELD_NAME,
];

pub const LESSON_COLUMNS: [&str; 11] = [
    ID_FIELD_NAME,
    SECTION_ID_FIELD_NAME,
    TITLE,
    DESCRIPTION,
    CONTENT,
    VIDEO_URL,
    VIDEO_DURATION,
    ORDER_INDEX_FIELD_NAME,
    IS_PREVIEW,
    CREATED_FIELD_NAME,
    UPDATED_FIELD_NAME,
];

pub const ENROLLMENT_COLUMNS: [&str; 6] = [
    ID_FIELD_NAME,
    USER_ID_FIELD_NAME,
    COURSE_ID_FIELD_NAME,
    ENROLLED_AT,
    COMPLETED_AT,
    PROGRESS,
];

pub const LESSON_PROGRESS_COLUMNS: [&str; 7] = [
    ID_FIELD_NAME,
    USER_ID_FIELD_NAME,
    LESSON_ID_FIELD_NAME,
    COMPLETED,
    COMPLETED_AT,
    WATCH_DURATION,
    LAST_WATCHED_AT,
];

/// Comma separated, quoted, unqualified column list for RETURNING and INSERT clauses.
pub fn column_list(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ")
}
