mod domain;

pub mod database;

// Course subsystem table names

pub const COURSES_TABLE: &str = "courses";
pub const SECTIONS_TABLE: &str = "course_sections";
pub const LESSONS_TABLE: &str = "lessons";
pub const ENROLLMENTS_TABLE: &str = "enrollments";
pub const LESSON_PROGRESS_TABLE: &str = "lesson_progress";

// Shared field names

pub const ID_FIELD_NAME: &str = "id";
pub const COURSE_ID_FIELD_NAME: &str = "course_id";
pub const SECTION_ID_FIELD_NAME: &str = "section_id";
pub const LESSON_ID_FIELD_NAME: &str = "lesson_id";
pub const USER_ID_FIELD_NAME: &str = "user_id";
pub const SLUG_FIELD_NAME: &str = "slug";
pub const ORDER_INDEX_FIELD_NAME: &str = "order_index";

pub const CREATED_FIELD_NAME: &str = "created_at";
pub const UPDATED_FIELD_NAME: &str = "updated_at";

// Course fields

pub const TITLE_FIELD_NAME: &str = "title";
pub const DESCRIPTION_FIELD_NAME: &str = "description";
pub const THUMBNAIL_FIELD_NAME: &str = "thumbnail";
pub const PRICE_FIELD_NAME: &str = "price";
pub const IS_FREE_FIELD_NAME: &str = "is_free";
pub const LEVEL_FIELD_NAME: &str = "level";
pub const STATUS_FIELD_NAME: &str = "status";
pub const INSTRUCTOR_ID_FIELD_NAME: &str = "instructor_id";

// Curriculum fields

pub const CONTENT_FIELD_NAME: &str = "content";
pub const VIDEO_URL_FIELD_NAME: &str = "video_url";
pub const VIDEO_DURATION_FIELD_NAME: &str = "video_duration";
pub const IS_PREVIEW_FIELD_NAME: &str = "is_preview";

// Learner fields

pub const ENROLLED_AT_FIELD_NAME: &str = "enrolled_at";
pub const COMPLETED_AT_FIELD_NAME: &str = "completed_at";
pub const PROGRESS_FIELD_NAME: &str = "progress";
pub const COMPLETED_FIELD_NAME: &str = "completed";
pub const WATCH_DURATION_FIELD_NAME: &str = "watch_duration";
pub const LAST_WATCHED_AT_FIELD_NAME: &str = "last_watched_at";

// expose domain module

pub use domain::*;
