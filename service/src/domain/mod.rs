use crate::domain::{
    catalog::Catalog, curriculum::CurriculumBuilder, enrollment::EnrollmentManager,
    progress::ProgressTracker, repository::CourseRepository,
};

pub mod access;
pub mod catalog;
pub mod context;
pub mod course;
pub mod curriculum;
pub mod enrollment;
pub mod error;
pub mod progress;
pub mod repository;

#[cfg(test)]
pub mod test_utils;

/// The global application state shared between all request handlers.
pub trait AppState: Clone + Send + Sync + 'static {
    type R: CourseRepository;

    fn catalog(&self) -> &Catalog<Self::R>;
    fn curriculum(&self) -> &CurriculumBuilder<Self::R>;
    fn enrollments(&self) -> &EnrollmentManager<Self::R>;
    fn progress(&self) -> &ProgressTracker<Self::R>;
}
