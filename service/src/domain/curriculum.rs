use chrono::Utc;
use serde::Deserialize;

use crate::domain::{
    catalog::parse_title,
    context::{Capability, RequestContext},
    course::{
        CourseId, CurriculumSection, Lesson, LessonFields, LessonId, Section, SectionFields,
        SectionId,
    },
    error::CourseError,
    repository::CourseRepository,
};

#[derive(Debug, Clone, Deserialize)]
pub struct SectionInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub order_index: i32,
}

impl SectionInput {
    fn validate(self) -> Result<SectionFields, CourseError> {
        Ok(SectionFields {
            title: parse_title(self.title)?,
            description: self.description,
            order_index: self.order_index,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSection {
    pub course_id: CourseId,
    #[serde(flatten)]
    pub section: SectionInput,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LessonInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub video_duration: i32,
    #[serde(default)]
    pub order_index: i32,
    #[serde(default)]
    pub is_preview: bool,
}

impl LessonInput {
    fn validate(self) -> Result<LessonFields, CourseError> {
        if self.video_duration < 0 {
            return Err(CourseError::InvalidInput(
                "video_duration must not be negative".to_string(),
            ));
        }
        Ok(LessonFields {
            title: parse_title(self.title)?,
            description: self.description,
            content: self.content,
            video_url: self.video_url,
            video_duration: self.video_duration,
            order_index: self.order_index,
            is_preview: self.is_preview,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLesson {
    pub section_id: SectionId,
    #[serde(flatten)]
    pub lesson: LessonInput,
}

/// Authoring of sections and lessons.
#[derive(Debug, Clone)]
pub struct CurriculumBuilder<R: CourseRepository> {
    repository: R,
}

impl<R: CourseRepository> CurriculumBuilder<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub async fn create_section(
        &self,
        ctx: &RequestContext,
        request: CreateSection,
    ) -> Result<Section, CourseError> {
        ctx.require(Capability::Author)?;
        let fields = request.section.validate()?;

        ctx.run("load course", self.repository.find_course(request.course_id))
            .await?
            .ok_or(CourseError::CourseNotFound)?;

        let section = Section::new(request.course_id, fields, Utc::now());
        ctx.run("create section", self.repository.create_section(&section))
            .await?;
        tracing::info!(section_id = %section.id, course_id = %section.course_id, "section created");
        Ok(section)
    }

    pub async fn update_section(
        &self,
        ctx: &RequestContext,
        id: SectionId,
        request: SectionInput,
    ) -> Result<Section, CourseError> {
        ctx.require(Capability::Author)?;
        let fields = request.validate()?;

        ctx.run(
            "update section",
            self.repository.update_section(id, &fields, Utc::now()),
        )
        .await?
        .ok_or(CourseError::SectionNotFound)
    }

    /// Removes the section with its lessons; unknown ids are not an error.
    pub async fn delete_section(
        &self,
        ctx: &RequestContext,
        id: SectionId,
    ) -> Result<(), CourseError> {
        ctx.require(Capability::Author)?;
        ctx.run("delete section", self.repository.delete_section(id))
            .await?;
        tracing::info!(section_id = %id, "section deleted");
        Ok(())
    }

    pub async fn create_lesson(
        &self,
        ctx: &RequestContext,
        request: CreateLesson,
    ) -> Result<Lesson, CourseError> {
        ctx.require(Capability::Author)?;
        let fields = request.lesson.validate()?;

        ctx.run("load section", self.repository.find_section(request.section_id))
            .await?
            .ok_or(CourseError::SectionNotFound)?;

        let lesson = Lesson::new(request.section_id, fields, Utc::now());
        ctx.run("create lesson", self.repository.create_lesson(&lesson))
            .await?;
        tracing::info!(lesson_id = %lesson.id, section_id = %lesson.section_id, "lesson created");
        Ok(lesson)
    }

    pub async fn update_lesson(
        &self,
        ctx: &RequestContext,
        id: LessonId,
        request: LessonInput,
    ) -> Result<Lesson, CourseError> {
        ctx.require(Capability::Author)?;
        let fields = request.validate()?;

        ctx.run(
            "update lesson",
            self.repository.update_lesson(id, &fields, Utc::now()),
        )
        .await?
        .ok_or(CourseError::LessonNotFound)
    }

    pub async fn delete_lesson(&self, ctx: &RequestContext, id: LessonId) -> Result<(), CourseError> {
        ctx.require(Capability::Author)?;
        ctx.run("delete lesson", self.repository.delete_lesson(id))
            .await?;
        tracing::info!(lesson_id = %id, "lesson deleted");
        Ok(())
    }

    pub async fn curriculum(
        &self,
        ctx: &RequestContext,
        course_id: CourseId,
    ) -> Result<Vec<CurriculumSection>, CourseError> {
        ctx.require(Capability::Author)?;
        ctx.run("load curriculum", self.repository.curriculum(course_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        course::CourseStatus,
        test_utils::{InMemoryCourseRepository, admin, seed_course, student},
    };

    fn builder() -> (
        InMemoryCourseRepository,
        CurriculumBuilder<InMemoryCourseRepository>,
    ) {
        let repository = InMemoryCourseRepository::new();
        (repository.clone(), CurriculumBuilder::new(repository))
    }

    fn section_input(title: &str, order_index: i32) -> SectionInput {
        SectionInput {
            title: title.to_string(),
            description: String::new(),
            order_index,
        }
    }

    fn lesson_input(title: &str, order_index: i32) -> LessonInput {
        LessonInput {
            title: title.to_string(),
            description: String::new(),
            content: String::new(),
            video_url: String::new(),
            video_duration: 0,
            order_index,
            is_preview: false,
        }
    }

    #[tokio::test]
    async fn created_lesson_is_returned_verbatim() {
        let (repository, builder) = builder();
        let course = seed_course(&repository, "Rust", CourseStatus::Draft, true).await;
        let ctx = admin();

        let section = builder
            .create_section(
                &ctx,
                CreateSection {
                    course_id: course.id,
                    section: section_input("Intro", 0),
                },
            )
            .await
            .unwrap();
        let lesson = builder
            .create_lesson(
                &ctx,
                CreateLesson {
                    section_id: section.id,
                    lesson: LessonInput {
                        video_duration: 120,
                        is_preview: true,
                        ..lesson_input("Welcome", 0)
                    },
                },
            )
            .await
            .unwrap();

        let curriculum = builder.curriculum(&ctx, course.id).await.unwrap();

        assert_eq!(curriculum.len(), 1);
        assert_eq!(curriculum[0].section.title.as_ref(), "Intro");
        assert_eq!(curriculum[0].section.order_index, 0);
        assert_eq!(curriculum[0].lessons, vec![lesson]);
        assert_eq!(curriculum[0].lessons[0].title.as_ref(), "Welcome");
        assert_eq!(curriculum[0].lessons[0].video_duration, 120);
        assert!(curriculum[0].lessons[0].is_preview);
    }

    #[tokio::test]
    async fn curriculum_is_ordered_by_index_then_creation() {
        let (repository, builder) = builder();
        let course = seed_course(&repository, "Rust", CourseStatus::Draft, true).await;
        let ctx = admin();

        for (title, index) in [("Third", 2), ("First", 0), ("Second", 1), ("Also second", 1)] {
            builder
                .create_section(
                    &ctx,
                    CreateSection {
                        course_id: course.id,
                        section: section_input(title, index),
                    },
                )
                .await
                .unwrap();
        }

        let titles: Vec<String> = builder
            .curriculum(&ctx, course.id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.section.title.to_string())
            .collect();
        assert_eq!(titles, vec!["First", "Second", "Also second", "Third"]);
    }

    #[tokio::test]
    async fn section_requires_existing_course() {
        let (_, builder) = builder();

        let error = builder
            .create_section(
                &admin(),
                CreateSection {
                    course_id: CourseId::generate(),
                    section: section_input("Intro", 0),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(error, CourseError::CourseNotFound));
    }

    #[tokio::test]
    async fn lesson_requires_existing_section() {
        let (_, builder) = builder();

        let error = builder
            .create_lesson(
                &admin(),
                CreateLesson {
                    section_id: SectionId::generate(),
                    lesson: lesson_input("Welcome", 0),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(error, CourseError::SectionNotFound));
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let (repository, builder) = builder();
        let course = seed_course(&repository, "Rust", CourseStatus::Draft, true).await;

        let error = builder
            .create_section(
                &admin(),
                CreateSection {
                    course_id: course.id,
                    section: section_input("   ", 0),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(error, CourseError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn updates_replace_fields() {
        let (repository, builder) = builder();
        let course = seed_course(&repository, "Rust", CourseStatus::Draft, true).await;
        let ctx = admin();
        let section = builder
            .create_section(
                &ctx,
                CreateSection {
                    course_id: course.id,
                    section: section_input("Intro", 0),
                },
            )
            .await
            .unwrap();

        let updated = builder
            .update_section(&ctx, section.id, section_input("Getting started", 3))
            .await
            .unwrap();
        assert_eq!(updated.title.as_ref(), "Getting started");
        assert_eq!(updated.order_index, 3);

        let error = builder
            .update_lesson(&ctx, LessonId::generate(), lesson_input("Ghost", 0))
            .await
            .unwrap_err();
        assert!(matches!(error, CourseError::LessonNotFound));
    }

    #[tokio::test]
    async fn deleting_a_section_drops_its_lessons() {
        let (repository, builder) = builder();
        let course = seed_course(&repository, "Rust", CourseStatus::Draft, true).await;
        let ctx = admin();
        let section = builder
            .create_section(
                &ctx,
                CreateSection {
                    course_id: course.id,
                    section: section_input("Intro", 0),
                },
            )
            .await
            .unwrap();
        let lesson = builder
            .create_lesson(
                &ctx,
                CreateLesson {
                    section_id: section.id,
                    lesson: lesson_input("Welcome", 0),
                },
            )
            .await
            .unwrap();

        builder.delete_section(&ctx, section.id).await.unwrap();

        assert!(builder.curriculum(&ctx, course.id).await.unwrap().is_empty());
        assert!(repository.find_lesson(lesson.id).await.unwrap().is_none());
        // deleting again is not an error
        builder.delete_section(&ctx, section.id).await.unwrap();
    }

    #[tokio::test]
    async fn learners_cannot_edit_curriculum() {
        let (_, builder) = builder();

        let error = builder
            .delete_lesson(&student("u-1"), LessonId::generate())
            .await
            .unwrap_err();
        assert!(matches!(error, CourseError::Forbidden));
    }
}
