use std::{collections::HashSet, future::Future};

use chrono::{DateTime, Utc};
use lectern_common::Slug;
use thiserror::Error;

use crate::domain::course::{
    Course, CourseChanges, CourseId, CourseOverview, CurriculumSection, Enrollment, Lesson,
    LessonFields, LessonId, LessonProgress, LessonTally, Progress, Section, SectionFields,
    SectionId, UserId,
};

pub mod query;

pub use query::{CoursePage, CourseQuery};

/// Storage of courses, their curriculum and learner state.
///
/// Lookups return `Ok(None)` for missing rows; deciding whether absence is an
/// error is left to the caller. Deleting a course or a section removes every
/// row it owns.
pub trait CourseRepository: Clone + Send + Sync + 'static {
    fn create_course(&self, course: &Course)
    -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn find_course(
        &self,
        id: CourseId,
    ) -> impl Future<Output = Result<Option<CourseOverview>, RepositoryError>> + Send;

    fn find_course_by_slug(
        &self,
        slug: &Slug,
    ) -> impl Future<Output = Result<Option<CourseOverview>, RepositoryError>> + Send;

    /// Courses matching the query, newest first, with the total count before paging.
    fn list_courses(
        &self,
        query: &CourseQuery,
    ) -> impl Future<Output = Result<CoursePage, RepositoryError>> + Send;

    fn update_course(
        &self,
        id: CourseId,
        changes: &CourseChanges,
        updated_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<Course>, RepositoryError>> + Send;

    fn delete_course(&self, id: CourseId)
    -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn create_section(
        &self,
        section: &Section,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn find_section(
        &self,
        id: SectionId,
    ) -> impl Future<Output = Result<Option<Section>, RepositoryError>> + Send;

    fn update_section(
        &self,
        id: SectionId,
        fields: &SectionFields,
        updated_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<Section>, RepositoryError>> + Send;

    fn delete_section(
        &self,
        id: SectionId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn create_lesson(&self, lesson: &Lesson)
    -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn find_lesson(
        &self,
        id: LessonId,
    ) -> impl Future<Output = Result<Option<Lesson>, RepositoryError>> + Send;

    fn update_lesson(
        &self,
        id: LessonId,
        fields: &LessonFields,
        updated_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<Lesson>, RepositoryError>> + Send;

    fn delete_lesson(&self, id: LessonId)
    -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Sections of the course with their lessons, both ordered by order index
    /// and then by creation.
    fn curriculum(
        &self,
        course_id: CourseId,
    ) -> impl Future<Output = Result<Vec<CurriculumSection>, RepositoryError>> + Send;

    /// Fails with [`RepositoryError::UniqueViolation`] when the pair is already enrolled.
    fn create_enrollment(
        &self,
        enrollment: &Enrollment,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn find_enrollment(
        &self,
        user_id: &UserId,
        course_id: CourseId,
    ) -> impl Future<Output = Result<Option<Enrollment>, RepositoryError>> + Send;

    /// Enrollments of the user with a summary of each course, newest first.
    fn list_enrollments(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Vec<Enrollment>, RepositoryError>> + Send;

    /// Stores the cached progress. The first time it reaches 100 the
    /// enrollment is marked completed at `at`.
    fn update_enrollment_progress(
        &self,
        user_id: &UserId,
        course_id: CourseId,
        progress: Progress,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Inserts or refreshes the progress row of the pair as completed at `at`.
    fn complete_lesson(
        &self,
        user_id: &UserId,
        lesson_id: LessonId,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<LessonProgress, RepositoryError>> + Send;

    fn find_lesson_progress(
        &self,
        user_id: &UserId,
        lesson_id: LessonId,
    ) -> impl Future<Output = Result<Option<LessonProgress>, RepositoryError>> + Send;

    fn completed_lessons(
        &self,
        user_id: &UserId,
        course_id: CourseId,
    ) -> impl Future<Output = Result<HashSet<LessonId>, RepositoryError>> + Send;

    fn lesson_tally(
        &self,
        user_id: &UserId,
        course_id: CourseId,
    ) -> impl Future<Output = Result<LessonTally, RepositoryError>> + Send;
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("database error: {0}")]
    DatabaseError(String),
}
