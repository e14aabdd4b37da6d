use chrono::Utc;

use crate::domain::{
    context::{Capability, RequestContext},
    course::{CourseId, Enrollment},
    error::CourseError,
    progress::refresh_progress,
    repository::CourseRepository,
};

#[derive(Debug, Clone)]
pub struct EnrollmentManager<R: CourseRepository> {
    repository: R,
}

impl<R: CourseRepository> EnrollmentManager<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Enrolls the caller into a published free course.
    pub async fn enroll(
        &self,
        ctx: &RequestContext,
        course_id: CourseId,
    ) -> Result<Enrollment, CourseError> {
        let user_id = &ctx.require(Capability::Learn)?.user_id;

        let existing = ctx
            .run(
                "load enrollment",
                self.repository.find_enrollment(user_id, course_id),
            )
            .await?;
        if existing.is_some() {
            return Err(CourseError::AlreadyEnrolled);
        }

        let course = ctx
            .run("load course", self.repository.find_course(course_id))
            .await?
            .ok_or(CourseError::CourseNotFound)?
            .course;
        if !course.is_published() {
            return Err(CourseError::CourseNotPublished);
        }
        // paid enrollment goes through checkout, which is not handled here
        if !course.is_free {
            return Err(CourseError::PaymentRequired);
        }

        let enrollment = Enrollment::new(user_id.clone(), course_id, Utc::now());
        ctx.run(
            "create enrollment",
            self.repository.create_enrollment(&enrollment),
        )
        .await
        .map_err(|error| {
            if error.is_unique_violation() {
                CourseError::AlreadyEnrolled
            } else {
                error
            }
        })?;

        tracing::info!(%user_id, %course_id, "enrolled");
        Ok(enrollment)
    }

    pub async fn enrollment(
        &self,
        ctx: &RequestContext,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, CourseError> {
        let user_id = &ctx.require(Capability::Learn)?.user_id;
        ctx.run(
            "load enrollment",
            self.repository.find_enrollment(user_id, course_id),
        )
        .await
    }

    /// The caller's enrollments with progress recomputed from lesson completions.
    pub async fn my_enrollments(&self, ctx: &RequestContext) -> Result<Vec<Enrollment>, CourseError> {
        let user_id = &ctx.require(Capability::Learn)?.user_id;

        let mut enrollments = ctx
            .run("list enrollments", self.repository.list_enrollments(user_id))
            .await?;
        for enrollment in enrollments.iter_mut() {
            let course_id = enrollment.course_id;
            match refresh_progress(&self.repository, ctx, user_id, course_id).await {
                Ok(progress) => enrollment.progress = progress,
                Err(error) => {
                    tracing::warn!(%user_id, %course_id, %error, "keeping stored course progress")
                }
            }
        }
        Ok(enrollments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        course::{CourseChanges, CourseStatus, Progress, UserId},
        test_utils::{
            InMemoryCourseRepository, seed_course, seed_enrollment, seed_lesson, seed_section,
            student,
        },
    };

    fn manager() -> (
        InMemoryCourseRepository,
        EnrollmentManager<InMemoryCourseRepository>,
    ) {
        let repository = InMemoryCourseRepository::new();
        (repository.clone(), EnrollmentManager::new(repository))
    }

    #[tokio::test]
    async fn enrolls_into_free_published_course() {
        let (repository, manager) = manager();
        let course = seed_course(&repository, "Rust", CourseStatus::Published, true).await;
        let ctx = student("u-1");

        let enrollment = manager.enroll(&ctx, course.id).await.unwrap();

        assert_eq!(enrollment.progress, Progress::ZERO);
        assert_eq!(enrollment.user_id, UserId::new("u-1"));
        assert!(manager.enrollment(&ctx, course.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn second_enrollment_is_rejected() {
        let (repository, manager) = manager();
        let course = seed_course(&repository, "Rust", CourseStatus::Published, true).await;
        let ctx = student("u-1");
        manager.enroll(&ctx, course.id).await.unwrap();

        let error = manager.enroll(&ctx, course.id).await.unwrap_err();

        assert!(matches!(error, CourseError::AlreadyEnrolled));
        assert_eq!(repository.enrollment_rows(), 1);
    }

    #[tokio::test]
    async fn paid_course_requires_payment_whatever_the_price() {
        let (repository, manager) = manager();
        let course = seed_course(&repository, "Rust", CourseStatus::Published, false).await;
        let changes = CourseChanges {
            price: Some(0.0),
            ..Default::default()
        };
        repository.update_course(course.id, &changes, Utc::now()).await.unwrap();

        let error = manager.enroll(&student("u-1"), course.id).await.unwrap_err();
        assert!(matches!(error, CourseError::PaymentRequired));
    }

    #[tokio::test]
    async fn draft_course_is_not_open_for_enrollment() {
        let (repository, manager) = manager();
        let course = seed_course(&repository, "Rust", CourseStatus::Draft, true).await;

        let error = manager.enroll(&student("u-1"), course.id).await.unwrap_err();
        assert!(matches!(error, CourseError::CourseNotPublished));
    }

    #[tokio::test]
    async fn unknown_course_is_reported() {
        let (_, manager) = manager();

        let error = manager
            .enroll(&student("u-1"), CourseId::generate())
            .await
            .unwrap_err();
        assert!(matches!(error, CourseError::CourseNotFound));
    }

    #[tokio::test]
    async fn listing_recomputes_and_stores_progress() {
        let (repository, manager) = manager();
        let course = seed_course(&repository, "Rust", CourseStatus::Published, true).await;
        let section = seed_section(&repository, course.id, "A", 0).await;
        let lessons = [
            seed_lesson(&repository, section.id, "One", 0, false).await,
            seed_lesson(&repository, section.id, "Two", 1, false).await,
            seed_lesson(&repository, section.id, "Three", 2, false).await,
            seed_lesson(&repository, section.id, "Four", 3, false).await,
        ];
        seed_enrollment(&repository, "u-1", course.id).await;
        let user = UserId::new("u-1");
        repository.complete_lesson(&user, lessons[0].id, Utc::now()).await.unwrap();

        let enrollments = manager.my_enrollments(&student("u-1")).await.unwrap();

        assert_eq!(enrollments.len(), 1);
        assert_eq!(enrollments[0].progress.value(), 25);
        let summary = enrollments[0].course.as_ref().unwrap();
        assert_eq!(summary.slug.as_ref(), "rust");

        let stored = repository.find_enrollment(&user, course.id).await.unwrap().unwrap();
        assert_eq!(stored.progress.value(), 25);
    }

    #[tokio::test]
    async fn listing_keeps_stored_progress_when_recount_fails() {
        let (repository, manager) = manager();
        let course = seed_course(&repository, "Rust", CourseStatus::Published, true).await;
        let section = seed_section(&repository, course.id, "A", 0).await;
        let lesson = seed_lesson(&repository, section.id, "One", 0, false).await;
        seed_lesson(&repository, section.id, "Two", 1, false).await;
        seed_enrollment(&repository, "u-1", course.id).await;
        let user = UserId::new("u-1");
        repository.complete_lesson(&user, lesson.id, Utc::now()).await.unwrap();
        repository
            .update_enrollment_progress(&user, course.id, Progress::of(1, 4), Utc::now())
            .await
            .unwrap();
        repository.fail_tally();

        let enrollments = manager.my_enrollments(&student("u-1")).await.unwrap();

        assert_eq!(enrollments.len(), 1);
        assert_eq!(enrollments[0].progress.value(), 25);
    }

    #[tokio::test]
    async fn enrolling_requires_identity() {
        let (repository, manager) = manager();
        let course = seed_course(&repository, "Rust", CourseStatus::Published, true).await;

        let error = manager
            .enroll(&RequestContext::anonymous(), course.id)
            .await
            .unwrap_err();
        assert!(matches!(error, CourseError::Unauthenticated));
    }
}
