use std::collections::HashSet;

use chrono::{DateTime, Utc};
use lectern_common::Slug;
use serde::Serialize;

use crate::domain::{
    course::{
        Course, CourseDetail, CourseId, CourseLevel, CourseOverview, CourseStatus, CurriculumSection,
        EnrolledCourse, Enrollment, EnrollmentId, Lesson, LessonId, LessonProgress,
        LessonProgressId, Progress, Section, SectionId, Title, UserId,
    },
    repository::CoursePage,
};

#[derive(Debug, Clone, Serialize)]
pub struct CourseResponse {
    id: CourseId,
    title: Title,
    slug: Slug,
    description: String,
    thumbnail: String,
    price: f64,
    is_free: bool,
    level: CourseLevel,
    status: CourseStatus,
    instructor_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Course> for CourseResponse {
    fn from(value: Course) -> Self {
        Self {
            id: value.id,
            title: value.title,
            slug: value.slug,
            description: value.description,
            thumbnail: value.thumbnail,
            price: value.price,
            is_free: value.is_free,
            level: value.level,
            status: value.status,
            instructor_id: value.instructor_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseSummaryResponse {
    #[serde(flatten)]
    course: CourseResponse,
    total_lessons: u32,
    total_duration: u64,
}

impl From<CourseOverview> for CourseSummaryResponse {
    fn from(value: CourseOverview) -> Self {
        Self {
            course: value.course.into(),
            total_lessons: value.total_lessons,
            total_duration: value.total_duration,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CoursePageResponse {
    courses: Vec<CourseSummaryResponse>,
    total: u64,
    page: u32,
    limit: u32,
    total_pages: u64,
}

impl From<CoursePage> for CoursePageResponse {
    fn from(value: CoursePage) -> Self {
        let total_pages = value.total_pages();
        Self {
            courses: value.courses.into_iter().map(Into::into).collect(),
            total: value.total,
            page: value.page,
            limit: value.limit,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseDetailResponse {
    #[serde(flatten)]
    summary: CourseSummaryResponse,
    sections: Vec<CurriculumSectionResponse>,
    is_enrolled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress: Option<Progress>,
    completed_lessons: HashSet<LessonId>,
}

impl From<CourseDetail> for CourseDetailResponse {
    fn from(value: CourseDetail) -> Self {
        Self {
            summary: value.overview.into(),
            sections: value.sections.into_iter().map(Into::into).collect(),
            is_enrolled: value.is_enrolled,
            progress: value.progress,
            completed_lessons: value.completed_lessons,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionResponse {
    id: SectionId,
    course_id: CourseId,
    title: Title,
    description: String,
    order_index: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Section> for SectionResponse {
    fn from(value: Section) -> Self {
        Self {
            id: value.id,
            course_id: value.course_id,
            title: value.title,
            description: value.description,
            order_index: value.order_index,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonResponse {
    id: LessonId,
    section_id: SectionId,
    title: Title,
    description: String,
    content: String,
    video_url: String,
    video_duration: i32,
    order_index: i32,
    is_preview: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Lesson> for LessonResponse {
    fn from(value: Lesson) -> Self {
        Self {
            id: value.id,
            section_id: value.section_id,
            title: value.title,
            description: value.description,
            content: value.content,
            video_url: value.video_url,
            video_duration: value.video_duration,
            order_index: value.order_index,
            is_preview: value.is_preview,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CurriculumSectionResponse {
    #[serde(flatten)]
    section: SectionResponse,
    lessons: Vec<LessonResponse>,
}

impl From<CurriculumSection> for CurriculumSectionResponse {
    fn from(value: CurriculumSection) -> Self {
        Self {
            section: value.section.into(),
            lessons: value.lessons.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrolledCourseResponse {
    title: Title,
    slug: Slug,
    thumbnail: String,
    level: CourseLevel,
}

impl From<EnrolledCourse> for EnrolledCourseResponse {
    fn from(value: EnrolledCourse) -> Self {
        Self {
            title: value.title,
            slug: value.slug,
            thumbnail: value.thumbnail,
            level: value.level,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentResponse {
    id: EnrollmentId,
    user_id: UserId,
    course_id: CourseId,
    enrolled_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    progress: Progress,
    #[serde(skip_serializing_if = "Option::is_none")]
    course: Option<EnrolledCourseResponse>,
}

impl From<Enrollment> for EnrollmentResponse {
    fn from(value: Enrollment) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            course_id: value.course_id,
            enrolled_at: value.enrolled_at,
            completed_at: value.completed_at,
            progress: value.progress,
            course: value.course.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonProgressResponse {
    id: LessonProgressId,
    lesson_id: LessonId,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
    watch_duration: i32,
    last_watched_at: Option<DateTime<Utc>>,
}

impl From<LessonProgress> for LessonProgressResponse {
    fn from(value: LessonProgress) -> Self {
        Self {
            id: value.id,
            lesson_id: value.lesson_id,
            completed: value.completed,
            completed_at: value.completed_at,
            watch_duration: value.watch_duration,
            last_watched_at: value.last_watched_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressResponse {
    progress: Progress,
}

impl From<Progress> for ProgressResponse {
    fn from(progress: Progress) -> Self {
        Self { progress }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
    message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}
