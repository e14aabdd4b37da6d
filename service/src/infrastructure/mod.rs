use crate::domain::{
    AppState, catalog::Catalog, curriculum::CurriculumBuilder, enrollment::EnrollmentManager,
    progress::ProgressTracker, repository::CourseRepository,
};

pub mod http;
pub mod persistence;
pub mod settings;

#[derive(Clone, Debug)]
pub struct AppStateImpl<R: CourseRepository> {
    catalog: Catalog<R>,
    curriculum: CurriculumBuilder<R>,
    enrollments: EnrollmentManager<R>,
    progress: ProgressTracker<R>,
}

impl<R: CourseRepository> AppStateImpl<R> {
    pub fn new(repository: R) -> Self {
        Self {
            catalog: Catalog::new(repository.clone()),
            curriculum: CurriculumBuilder::new(repository.clone()),
            enrollments: EnrollmentManager::new(repository.clone()),
            progress: ProgressTracker::new(repository),
        }
    }
}

impl<R: CourseRepository> AppState for AppStateImpl<R> {
    type R = R;

    fn catalog(&self) -> &Catalog<Self::R> {
        &self.catalog
    }

    fn curriculum(&self) -> &CurriculumBuilder<Self::R> {
        &self.curriculum
    }

    fn enrollments(&self) -> &EnrollmentManager<Self::R> {
        &self.enrollments
    }

    fn progress(&self) -> &ProgressTracker<Self::R> {
        &self.progress
    }
}
