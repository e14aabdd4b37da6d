use std::{collections::HashSet, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use lectern_common::Slug;
use nutype::nutype;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::CourseError;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(CourseId);
entity_id!(SectionId);
entity_id!(LessonId);
entity_id!(EnrollmentId);
entity_id!(LessonProgressId);

/// Opaque identity assigned by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new<T: Into<String>>(value: T) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display title of a course, section or lesson.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 255),
    derive(Clone, Debug, Display, AsRef, PartialEq, Eq, Serialize)
)]
pub struct Title(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseLevel::Beginner => "beginner",
            CourseLevel::Intermediate => "intermediate",
            CourseLevel::Advanced => "advanced",
        }
    }
}

impl FromStr for CourseLevel {
    type Err = CourseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(CourseLevel::Beginner),
            "intermediate" => Ok(CourseLevel::Intermediate),
            "advanced" => Ok(CourseLevel::Advanced),
            other => Err(CourseError::InvalidLevel(other.to_string())),
        }
    }
}

impl Display for CourseLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    #[default]
    Draft,
    Published,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Draft => "draft",
            CourseStatus::Published => "published",
        }
    }
}

impl FromStr for CourseStatus {
    type Err = CourseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(CourseStatus::Draft),
            "published" => Ok(CourseStatus::Published),
            other => Err(CourseError::InvalidStatus(other.to_string())),
        }
    }
}

impl Display for CourseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completion percentage of a course, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct Progress(u8);

impl Progress {
    pub const ZERO: Progress = Progress(0);
    pub const COMPLETE: Progress = Progress(100);

    /// `completed / total` as a percentage rounded half up, zero for an empty course.
    pub fn of(completed: u64, total: u64) -> Self {
        if total == 0 {
            return Self::ZERO;
        }
        let completed = completed.min(total);
        // floor(100 * c / t + 1/2) in integers
        let percent = (200 * completed + total) / (2 * total);
        Self(percent as u8)
    }

    /// Restores a cached value, clamping anything the store may hold out of range.
    pub fn from_stored(value: i32) -> Self {
        Self(value.clamp(0, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_complete(self) -> bool {
        self == Self::COMPLETE
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub id: CourseId,
    pub title: Title,
    pub slug: Slug,
    pub description: String,
    pub thumbnail: String,
    pub price: f64,
    pub is_free: bool,
    pub level: CourseLevel,
    pub status: CourseStatus,
    pub instructor_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn is_published(&self) -> bool {
        self.status == CourseStatus::Published
    }
}

/// Partial course update, `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseChanges {
    pub title: Option<Title>,
    pub slug: Option<Slug>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub price: Option<f64>,
    pub is_free: Option<bool>,
    pub level: Option<CourseLevel>,
    pub status: Option<CourseStatus>,
}

/// A course together with the figures derived from its curriculum.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseOverview {
    pub course: Course,
    pub total_lessons: u32,
    /// Sum of lesson video durations, in seconds.
    pub total_duration: u64,
}

/// Everything a viewer sees on a course page.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseDetail {
    pub overview: CourseOverview,
    pub sections: Vec<CurriculumSection>,
    pub is_enrolled: bool,
    pub progress: Option<Progress>,
    pub completed_lessons: HashSet<LessonId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionFields {
    pub title: Title,
    pub description: String,
    pub order_index: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: SectionId,
    pub course_id: CourseId,
    pub title: Title,
    pub description: String,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Section {
    pub fn new(course_id: CourseId, fields: SectionFields, now: DateTime<Utc>) -> Self {
        Self {
            id: SectionId::generate(),
            course_id,
            title: fields.title,
            description: fields.description,
            order_index: fields.order_index,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LessonFields {
    pub title: Title,
    pub description: String,
    pub content: String,
    pub video_url: String,
    /// Seconds.
    pub video_duration: i32,
    pub order_index: i32,
    pub is_preview: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    pub id: LessonId,
    pub section_id: SectionId,
    pub title: Title,
    pub description: String,
    pub content: String,
    pub video_url: String,
    pub video_duration: i32,
    pub order_index: i32,
    pub is_preview: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lesson {
    pub fn new(section_id: SectionId, fields: LessonFields, now: DateTime<Utc>) -> Self {
        Self {
            id: LessonId::generate(),
            section_id,
            title: fields.title,
            description: fields.description,
            content: fields.content,
            video_url: fields.video_url,
            video_duration: fields.video_duration,
            order_index: fields.order_index,
            is_preview: fields.is_preview,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A section with its lessons, both in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct CurriculumSection {
    pub section: Section,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub progress: Progress,
    /// Present when the enrollment was loaded for a listing.
    pub course: Option<EnrolledCourse>,
}

impl Enrollment {
    pub fn new(user_id: UserId, course_id: CourseId, now: DateTime<Utc>) -> Self {
        Self {
            id: EnrollmentId::generate(),
            user_id,
            course_id,
            enrolled_at: now,
            completed_at: None,
            progress: Progress::ZERO,
            course: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrolledCourse {
    pub title: Title,
    pub slug: Slug,
    pub thumbnail: String,
    pub level: CourseLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LessonProgress {
    pub id: LessonProgressId,
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    /// Seconds.
    pub watch_duration: i32,
    pub last_watched_at: Option<DateTime<Utc>>,
}

/// Completed and total lesson counts of one learner in one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LessonTally {
    pub completed: u64,
    pub total: u64,
}

impl LessonTally {
    pub fn progress(&self) -> Progress {
        Progress::of(self.completed, self.total)
    }
}
