use chrono::Utc;

use crate::domain::{
    context::{Capability, RequestContext},
    course::{CourseId, LessonId, LessonProgress, Progress, UserId},
    error::CourseError,
    repository::CourseRepository,
};

/// Records lesson completions and reports course progress.
#[derive(Debug, Clone)]
pub struct ProgressTracker<R: CourseRepository> {
    repository: R,
}

impl<R: CourseRepository> ProgressTracker<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Marks the lesson completed for the caller and refreshes the cached
    /// progress of the enrollment. Completing a lesson again only moves its
    /// timestamps.
    pub async fn complete_lesson(
        &self,
        ctx: &RequestContext,
        lesson_id: LessonId,
    ) -> Result<LessonProgress, CourseError> {
        let user_id = &ctx.require(Capability::Learn)?.user_id;

        let lesson = ctx
            .run("load lesson", self.repository.find_lesson(lesson_id))
            .await?
            .ok_or(CourseError::LessonNotFound)?;
        let section = ctx
            .run("load section", self.repository.find_section(lesson.section_id))
            .await?
            .ok_or(CourseError::CourseNotFound)?;
        let course_id = section.course_id;

        ctx.run(
            "load enrollment",
            self.repository.find_enrollment(user_id, course_id),
        )
        .await?
        .ok_or(CourseError::NotEnrolled)?;

        let record = ctx
            .run(
                "complete lesson",
                self.repository.complete_lesson(user_id, lesson_id, Utc::now()),
            )
            .await?;

        if let Err(error) = refresh_progress(&self.repository, ctx, user_id, course_id).await {
            tracing::warn!(%user_id, %course_id, %error, "failed to recompute course progress");
        }

        tracing::debug!(%user_id, %lesson_id, "lesson completed");
        Ok(record)
    }

    /// Share of the course's lessons the caller has completed.
    pub async fn course_progress(
        &self,
        ctx: &RequestContext,
        course_id: CourseId,
    ) -> Result<Progress, CourseError> {
        let user_id = &ctx.require(Capability::Learn)?.user_id;

        ctx.run(
            "load enrollment",
            self.repository.find_enrollment(user_id, course_id),
        )
        .await?
        .ok_or(CourseError::NotEnrolled)?;

        let tally = ctx
            .run(
                "count lessons",
                self.repository.lesson_tally(user_id, course_id),
            )
            .await?;
        Ok(tally.progress())
    }
}

/// Recomputes progress from the lesson rows and writes it back to the
/// enrollment. A failed write is logged and ignored.
pub(crate) async fn refresh_progress<R: CourseRepository>(
    repository: &R,
    ctx: &RequestContext,
    user_id: &UserId,
    course_id: CourseId,
) -> Result<Progress, CourseError> {
    let progress = ctx
        .run("count lessons", repository.lesson_tally(user_id, course_id))
        .await?
        .progress();

    let stored = ctx
        .run(
            "store progress",
            repository.update_enrollment_progress(user_id, course_id, progress, Utc::now()),
        )
        .await;
    if let Err(error) = stored {
        tracing::warn!(%user_id, %course_id, %error, "failed to store course progress");
    }

    Ok(progress)
}
