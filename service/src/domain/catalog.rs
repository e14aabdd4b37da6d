use std::collections::HashSet;

use chrono::Utc;
use lectern_common::Slug;
use serde::Deserialize;

use crate::domain::{
    access::CourseAccess,
    context::{Capability, RequestContext},
    course::{
        Course, CourseChanges, CourseDetail, CourseId, CourseLevel, CourseOverview, CourseStatus,
        Title, UserId,
    },
    error::CourseError,
    progress::refresh_progress,
    repository::{CoursePage, CourseQuery, CourseRepository},
};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCourse {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub is_free: bool,
    pub level: Option<String>,
    pub status: Option<String>,
}

/// Fields left out keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCourse {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub price: Option<f64>,
    pub is_free: Option<bool>,
    pub level: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseFilter {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub level: Option<String>,
    pub is_free: Option<bool>,
    pub instructor_id: Option<String>,
    pub search: Option<String>,
}

impl CourseFilter {
    fn into_query(self) -> Result<CourseQuery, CourseError> {
        let mut query = CourseQuery::new(self.page, self.limit);
        query.level = non_blank(self.level)
            .map(|level| level.parse::<CourseLevel>())
            .transpose()?;
        query.is_free = self.is_free;
        query.instructor_id = non_blank(self.instructor_id).map(UserId::new);
        query.search = non_blank(self.search);
        Ok(query)
    }
}

/// Course authoring and the public catalog.
#[derive(Debug, Clone)]
pub struct Catalog<R: CourseRepository> {
    repository: R,
}

impl<R: CourseRepository> Catalog<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub async fn create_course(
        &self,
        ctx: &RequestContext,
        request: CreateCourse,
    ) -> Result<Course, CourseError> {
        let actor = ctx.require(Capability::Author)?;

        let title = parse_title(request.title)?;
        let slug = slug_for(&title)?;
        let level = non_blank(request.level)
            .map(|level| level.parse::<CourseLevel>())
            .transpose()?
            .unwrap_or_default();
        let status = non_blank(request.status)
            .map(|status| status.parse::<CourseStatus>())
            .transpose()?
            .unwrap_or_default();
        check_price(request.price)?;

        let now = Utc::now();
        let course = Course {
            id: CourseId::generate(),
            title,
            slug,
            description: request.description,
            thumbnail: request.thumbnail,
            price: request.price,
            is_free: request.is_free,
            level,
            status,
            instructor_id: actor.user_id.clone(),
            created_at: now,
            updated_at: now,
        };

        ctx.run("create course", self.repository.create_course(&course))
            .await
            .map_err(|error| duplicate_slug(error, &course.slug))?;

        tracing::info!(course_id = %course.id, slug = %course.slug, "course created");
        Ok(course)
    }

    /// Course page by slug. Drafts exist only for authors; the curriculum is
    /// gated unless the course is free or the caller is enrolled.
    pub async fn course_by_slug(
        &self,
        ctx: &RequestContext,
        slug: &str,
    ) -> Result<CourseDetail, CourseError> {
        let slug = Slug::try_new(slug).map_err(|_| CourseError::CourseNotFound)?;
        let overview = ctx
            .run("load course", self.repository.find_course_by_slug(&slug))
            .await?
            .ok_or(CourseError::CourseNotFound)?;
        if !overview.course.is_published() && !ctx.can(Capability::Author) {
            return Err(CourseError::CourseNotFound);
        }

        let mut detail = self.detail(ctx, overview).await?;

        if let Some(actor) = ctx.actor() {
            let course_id = detail.overview.course.id;
            let enrollment = ctx
                .run(
                    "load enrollment",
                    self.repository.find_enrollment(&actor.user_id, course_id),
                )
                .await?;
            if enrollment.is_some() {
                detail.is_enrolled = true;
                match refresh_progress(&self.repository, ctx, &actor.user_id, course_id).await {
                    Ok(progress) => detail.progress = Some(progress),
                    Err(error) => tracing::warn!(
                        user_id = %actor.user_id,
                        %course_id,
                        %error,
                        "course progress unavailable"
                    ),
                }
                detail.completed_lessons = ctx
                    .run(
                        "load completed lessons",
                        self.repository.completed_lessons(&actor.user_id, course_id),
                    )
                    .await?;
            }
        }

        let access = CourseAccess::for_viewer(detail.is_enrolled, detail.overview.course.is_free);
        detail.sections = access.apply(detail.sections);
        Ok(detail)
    }

    /// Full course for authors, drafts included and nothing gated.
    pub async fn course_by_id(
        &self,
        ctx: &RequestContext,
        id: CourseId,
    ) -> Result<CourseDetail, CourseError> {
        ctx.require(Capability::Author)?;

        let overview = ctx
            .run("load course", self.repository.find_course(id))
            .await?
            .ok_or(CourseError::CourseNotFound)?;
        self.detail(ctx, overview).await
    }

    /// Published courses, open to everyone.
    pub async fn list_courses(
        &self,
        ctx: &RequestContext,
        filter: CourseFilter,
    ) -> Result<CoursePage, CourseError> {
        let query = filter.into_query()?;
        ctx.run("list courses", self.repository.list_courses(&query))
            .await
    }

    /// Every course including drafts.
    pub async fn list_all_courses(
        &self,
        ctx: &RequestContext,
        filter: CourseFilter,
    ) -> Result<CoursePage, CourseError> {
        ctx.require(Capability::Author)?;

        let query = filter.into_query()?.including_drafts();
        ctx.run("list courses", self.repository.list_courses(&query))
            .await
    }

    /// Applies a partial update. A new title also replaces the slug.
    pub async fn update_course(
        &self,
        ctx: &RequestContext,
        id: CourseId,
        request: UpdateCourse,
    ) -> Result<Course, CourseError> {
        ctx.require(Capability::Author)?;

        let mut changes = CourseChanges::default();
        if let Some(title) = request.title {
            let title = parse_title(title)?;
            changes.slug = Some(slug_for(&title)?);
            changes.title = Some(title);
        }
        changes.level = request
            .level
            .map(|level| level.parse::<CourseLevel>())
            .transpose()?;
        changes.status = request
            .status
            .map(|status| status.parse::<CourseStatus>())
            .transpose()?;
        if let Some(price) = request.price {
            check_price(price)?;
        }
        changes.price = request.price;
        changes.description = request.description;
        changes.thumbnail = request.thumbnail;
        changes.is_free = request.is_free;

        let updated = ctx
            .run(
                "update course",
                self.repository.update_course(id, &changes, Utc::now()),
            )
            .await;
        let course = match (updated, &changes.slug) {
            (Err(error), Some(slug)) => return Err(duplicate_slug(error, slug)),
            (result, _) => result?.ok_or(CourseError::CourseNotFound)?,
        };

        tracing::info!(course_id = %course.id, "course updated");
        Ok(course)
    }

    pub async fn delete_course(&self, ctx: &RequestContext, id: CourseId) -> Result<(), CourseError> {
        ctx.require(Capability::Author)?;

        ctx.run("delete course", self.repository.delete_course(id))
            .await?;
        tracing::info!(course_id = %id, "course deleted");
        Ok(())
    }

    async fn detail(
        &self,
        ctx: &RequestContext,
        overview: CourseOverview,
    ) -> Result<CourseDetail, CourseError> {
        let sections = ctx
            .run(
                "load curriculum",
                self.repository.curriculum(overview.course.id),
            )
            .await?;
        Ok(CourseDetail {
            overview,
            sections,
            is_enrolled: false,
            progress: None,
            completed_lessons: HashSet::new(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn parse_title(title: String) -> Result<Title, CourseError> {
    Title::try_new(title).map_err(|e| CourseError::InvalidInput(format!("title: {}", e)))
}

fn slug_for(title: &Title) -> Result<Slug, CourseError> {
    Slug::from_title(title.as_ref()).map_err(|_| {
        CourseError::InvalidInput("title must contain at least one letter or digit".to_string())
    })
}

fn check_price(price: f64) -> Result<(), CourseError> {
    if price.is_finite() && price >= 0.0 {
        Ok(())
    } else {
        Err(CourseError::InvalidInput(
            "price must be a non-negative number".to_string(),
        ))
    }
}

fn duplicate_slug(error: CourseError, slug: &Slug) -> CourseError {
    if error.is_unique_violation() {
        CourseError::DuplicateSlug(slug.to_string())
    } else {
        error
    }
}
