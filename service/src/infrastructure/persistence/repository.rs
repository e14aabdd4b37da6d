use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use itertools::Itertools;
use lectern_common::{
    COURSE_ID_FIELD_NAME, COURSES_TABLE, CREATED_FIELD_NAME, ENROLLMENTS_TABLE, ID_FIELD_NAME,
    LESSON_ID_FIELD_NAME, LESSON_PROGRESS_TABLE, LESSONS_TABLE, ORDER_INDEX_FIELD_NAME,
    SECTION_ID_FIELD_NAME, SECTIONS_TABLE, SLUG_FIELD_NAME, Slug, UPDATED_FIELD_NAME,
    USER_ID_FIELD_NAME, database::Database,
};
use sqlx::{PgPool, Row};

use crate::{
    domain::{
        course::{
            Course, CourseChanges, CourseId, CourseOverview, CourseStatus, CurriculumSection,
            Enrollment, Lesson, LessonFields, LessonId, LessonProgress, LessonProgressId,
            LessonTally, Progress, Section, SectionFields, SectionId, UserId,
        },
        repository::{CoursePage, CourseQuery, CourseRepository, RepositoryError},
    },
    infrastructure::persistence::{
        columns::{
            COMPLETED, COMPLETED_AT, CONTENT, COURSE_COLUMNS, COURSE_LEVEL, COURSE_SLUG,
            COURSE_THUMBNAIL, COURSE_TITLE, COURSES, DESCRIPTION, ENROLLED_AT, ENROLLMENT_COLUMNS,
            ENROLLMENTS, INSTRUCTOR_ID, IS_FREE, IS_PREVIEW, LAST_WATCHED_AT, LESSON_COLUMNS,
            LESSON_PROGRESS, LESSON_PROGRESS_COLUMNS, LESSONS, LEVEL, PRICE, PROGRESS,
            SECTION_COLUMNS, SECTIONS, STATUS, THUMBNAIL, TITLE, TOTAL_DURATION, TOTAL_LESSONS,
            VIDEO_DURATION, VIDEO_URL, column_list,
        },
        parameters::{SqlParameter, bind_all},
        query::{Condition, JoinType, QueryBuilder, SortDirection},
        result::{
            row_to_course, row_to_enrollment, row_to_lesson, row_to_lesson_progress,
            row_to_listed_enrollment, row_to_overview, row_to_section,
        },
    },
};

#[derive(Clone, Debug)]
pub struct PostgresCourseRepository {
    database: &'static Database,
}

impl PostgresCourseRepository {
    pub fn new(database: &'static Database) -> Self {
        Self { database }
    }

    fn pool(&self) -> &PgPool {
        self.database.database_pool()
    }
}

fn database_error(error: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            return RepositoryError::UniqueViolation(
                db_error.constraint().unwrap_or_default().to_string(),
            );
        }
    }
    RepositoryError::DatabaseError(error.to_string())
}

/// SELECT c.*, COUNT(l.id) AS total_lessons, COALESCE(SUM(l.video_duration), 0) AS total_duration
/// FROM courses c
/// LEFT JOIN course_sections s ON c.id = s.course_id
/// LEFT JOIN lessons l ON s.id = l.section_id
/// WHERE ...
/// GROUP BY c.id
pub fn overview_query(conditions: Vec<Condition<'static>>) -> QueryBuilder<'static> {
    QueryBuilder::from(COURSES)
        .select(COURSES.columns(&COURSE_COLUMNS))
        .select_expression(
            format!("COUNT({})", LESSONS.column(ID_FIELD_NAME).qualified()),
            TOTAL_LESSONS,
        )
        .select_expression(
            format!(
                "COALESCE(SUM({}), 0)",
                LESSONS.column(VIDEO_DURATION).qualified()
            ),
            TOTAL_DURATION,
        )
        .join(
            JoinType::Left,
            SECTIONS,
            COURSES.column(ID_FIELD_NAME),
            SECTIONS.column(COURSE_ID_FIELD_NAME),
        )
        .join(
            JoinType::Left,
            LESSONS,
            SECTIONS.column(ID_FIELD_NAME),
            LESSONS.column(SECTION_ID_FIELD_NAME),
        )
        .where_conditions(conditions)
        .group_by(COURSES.column(ID_FIELD_NAME))
}

fn listing_conditions(query: &CourseQuery) -> Vec<Condition<'static>> {
    let mut conditions = Vec::new();
    if query.published_only {
        conditions.push(Condition::Equals {
            column: COURSES.column(STATUS),
            value: SqlParameter::from(CourseStatus::Published.as_str()),
        });
    }
    if let Some(level) = query.level {
        conditions.push(Condition::Equals {
            column: COURSES.column(LEVEL),
            value: SqlParameter::from(level.as_str()),
        });
    }
    if let Some(is_free) = query.is_free {
        conditions.push(Condition::Equals {
            column: COURSES.column(IS_FREE),
            value: SqlParameter::from(is_free),
        });
    }
    if let Some(instructor_id) = &query.instructor_id {
        conditions.push(Condition::Equals {
            column: COURSES.column(INSTRUCTOR_ID),
            value: SqlParameter::from(instructor_id.as_str()),
        });
    }
    if let Some(search) = &query.search {
        conditions.push(Condition::Or(
            Box::new(Condition::Contains {
                column: COURSES.column(TITLE),
                value: search.clone(),
            }),
            Box::new(Condition::Contains {
                column: COURSES.column(DESCRIPTION),
                value: search.clone(),
            }),
        ));
    }
    conditions
}

/// Page of the listing, newest first.
pub fn listing_query(query: &CourseQuery) -> (String, Vec<SqlParameter>) {
    overview_query(listing_conditions(query))
        .order_by(COURSES.column(CREATED_FIELD_NAME), SortDirection::Descending)
        .limit(u64::from(query.limit()))
        .offset(query.offset())
        .build()
}

/// Number of courses matching the listing filter across all pages.
pub fn listing_count_query(query: &CourseQuery) -> (String, Vec<SqlParameter>) {
    QueryBuilder::from(COURSES)
        .select_expression("COUNT(*)", "total")
        .where_conditions(listing_conditions(query))
        .build()
}

/// Partial UPDATE of a course touching only the changed columns.
pub fn course_update(
    id: CourseId,
    changes: &CourseChanges,
    updated_at: DateTime<Utc>,
) -> (String, Vec<SqlParameter>) {
    let mut assignments: Vec<(&str, SqlParameter)> = Vec::new();
    if let Some(title) = &changes.title {
        assignments.push((TITLE, title.as_ref().into()));
    }
    if let Some(slug) = &changes.slug {
        assignments.push((SLUG_FIELD_NAME, slug.as_ref().into()));
    }
    if let Some(description) = &changes.description {
        assignments.push((DESCRIPTION, description.clone().into()));
    }
    if let Some(thumbnail) = &changes.thumbnail {
        assignments.push((THUMBNAIL, thumbnail.clone().into()));
    }
    if let Some(price) = changes.price {
        assignments.push((PRICE, price.into()));
    }
    if let Some(is_free) = changes.is_free {
        assignments.push((IS_FREE, is_free.into()));
    }
    if let Some(level) = changes.level {
        assignments.push((LEVEL, level.as_str().into()));
    }
    if let Some(status) = changes.status {
        assignments.push((STATUS, status.as_str().into()));
    }
    assignments.push((UPDATED_FIELD_NAME, updated_at.into()));

    let set_clause = assignments
        .iter()
        .enumerate()
        .map(|(index, (column, _))| format!("\"{}\" = ${}", column, index + 1))
        .join(", ");
    let sql = format!(
        "UPDATE \"{}\" SET {} WHERE \"{}\" = ${} RETURNING {}",
        COURSES_TABLE,
        set_clause,
        ID_FIELD_NAME,
        assignments.len() + 1,
        column_list(&COURSE_COLUMNS)
    );

    let mut params: Vec<SqlParameter> = assignments.into_iter().map(|(_, value)| value).collect();
    params.push(id.0.into());
    (sql, params)
}

fn placeholders(count: usize) -> String {
    (1..=count).map(|index| format!("${}", index)).join(", ")
}

impl CourseRepository for PostgresCourseRepository {
    async fn create_course(&self, course: &Course) -> Result<(), RepositoryError> {
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            COURSES_TABLE,
            column_list(&COURSE_COLUMNS),
            placeholders(COURSE_COLUMNS.len())
        );
        sqlx::query(&sql)
            .bind(course.id.0)
            .bind(course.title.as_ref())
            .bind(course.slug.as_ref())
            .bind(&course.description)
            .bind(&course.thumbnail)
            .bind(course.price)
            .bind(course.is_free)
            .bind(course.level.as_str())
            .bind(course.status.as_str())
            .bind(course.instructor_id.as_str())
            .bind(course.created_at)
            .bind(course.updated_at)
            .execute(self.pool())
            .await
            .map_err(database_error)?;
        Ok(())
    }

    async fn find_course(&self, id: CourseId) -> Result<Option<CourseOverview>, RepositoryError> {
        let (sql, params) = overview_query(vec![Condition::Equals {
            column: COURSES.column(ID_FIELD_NAME),
            value: id.0.into(),
        }])
        .build();
        tracing::debug!("{}", sql);

        bind_all(&sql, params)
            .fetch_optional(self.pool())
            .await
            .map_err(database_error)?
            .as_ref()
            .map(row_to_overview)
            .transpose()
    }

    async fn find_course_by_slug(
        &self,
        slug: &Slug,
    ) -> Result<Option<CourseOverview>, RepositoryError> {
        let (sql, params) = overview_query(vec![Condition::Equals {
            column: COURSES.column(SLUG_FIELD_NAME),
            value: slug.as_ref().into(),
        }])
        .build();
        tracing::debug!("{}", sql);

        bind_all(&sql, params)
            .fetch_optional(self.pool())
            .await
            .map_err(database_error)?
            .as_ref()
            .map(row_to_overview)
            .transpose()
    }

    async fn list_courses(&self, query: &CourseQuery) -> Result<CoursePage, RepositoryError> {
        let (count_sql, count_params) = listing_count_query(query);
        let total: i64 = bind_all(&count_sql, count_params)
            .fetch_one(self.pool())
            .await
            .map_err(database_error)?
            .try_get("total")
            .map_err(database_error)?;

        let (sql, params) = listing_query(query);
        tracing::debug!("{}", sql);

        let mut rows = bind_all(&sql, params).fetch(self.pool());
        let mut courses = Vec::new();
        while let Some(row) = rows.try_next().await.map_err(database_error)? {
            courses.push(row_to_overview(&row)?);
        }

        Ok(CoursePage {
            courses,
            total: u64::try_from(total).unwrap_or_default(),
            page: query.page(),
            limit: query.limit(),
        })
    }

    async fn update_course(
        &self,
        id: CourseId,
        changes: &CourseChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Course>, RepositoryError> {
        let (sql, params) = course_update(id, changes, updated_at);
        tracing::debug!("{}", sql);

        bind_all(&sql, params)
            .fetch_optional(self.pool())
            .await
            .map_err(database_error)?
            .as_ref()
            .map(row_to_course)
            .transpose()
    }

    async fn delete_course(&self, id: CourseId) -> Result<(), RepositoryError> {
        let statements = [
            format!(
                "DELETE FROM \"{progress}\" WHERE \"{lesson_id}\" IN (SELECT l.\"id\" FROM \"{lessons}\" l JOIN \"{sections}\" s ON s.\"id\" = l.\"{section_id}\" WHERE s.\"{course_id}\" = $1)",
                progress = LESSON_PROGRESS_TABLE,
                lesson_id = LESSON_ID_FIELD_NAME,
                lessons = LESSONS_TABLE,
                sections = SECTIONS_TABLE,
                section_id = SECTION_ID_FIELD_NAME,
                course_id = COURSE_ID_FIELD_NAME,
            ),
            format!(
                "DELETE FROM \"{lessons}\" WHERE \"{section_id}\" IN (SELECT \"id\" FROM \"{sections}\" WHERE \"{course_id}\" = $1)",
                lessons = LESSONS_TABLE,
                section_id = SECTION_ID_FIELD_NAME,
                sections = SECTIONS_TABLE,
                course_id = COURSE_ID_FIELD_NAME,
            ),
            format!(
                "DELETE FROM \"{}\" WHERE \"{}\" = $1",
                SECTIONS_TABLE, COURSE_ID_FIELD_NAME
            ),
            format!(
                "DELETE FROM \"{}\" WHERE \"{}\" = $1",
                ENROLLMENTS_TABLE, COURSE_ID_FIELD_NAME
            ),
            format!(
                "DELETE FROM \"{}\" WHERE \"{}\" = $1",
                COURSES_TABLE, ID_FIELD_NAME
            ),
        ];
        self.delete_in_transaction(&statements, id.0, "delete course")
            .await
    }

    async fn create_section(&self, section: &Section) -> Result<(), RepositoryError> {
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            SECTIONS_TABLE,
            column_list(&SECTION_COLUMNS),
            placeholders(SECTION_COLUMNS.len())
        );
        sqlx::query(&sql)
            .bind(section.id.0)
            .bind(section.course_id.0)
            .bind(section.title.as_ref())
            .bind(&section.description)
            .bind(section.order_index)
            .bind(section.created_at)
            .bind(section.updated_at)
            .execute(self.pool())
            .await
            .map_err(database_error)?;
        Ok(())
    }

    async fn find_section(&self, id: SectionId) -> Result<Option<Section>, RepositoryError> {
        let (sql, params) = QueryBuilder::from(SECTIONS)
            .select(SECTIONS.columns(&SECTION_COLUMNS))
            .where_condition(Condition::Equals {
                column: SECTIONS.column(ID_FIELD_NAME),
                value: id.0.into(),
            })
            .build();

        bind_all(&sql, params)
            .fetch_optional(self.pool())
            .await
            .map_err(database_error)?
            .as_ref()
            .map(row_to_section)
            .transpose()
    }

    async fn update_section(
        &self,
        id: SectionId,
        fields: &SectionFields,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Section>, RepositoryError> {
        let sql = format!(
            "UPDATE \"{}\" SET \"{}\" = $1, \"{}\" = $2, \"{}\" = $3, \"{}\" = $4 WHERE \"{}\" = $5 RETURNING {}",
            SECTIONS_TABLE,
            TITLE,
            DESCRIPTION,
            ORDER_INDEX_FIELD_NAME,
            UPDATED_FIELD_NAME,
            ID_FIELD_NAME,
            column_list(&SECTION_COLUMNS)
        );
        sqlx::query(&sql)
            .bind(fields.title.as_ref())
            .bind(&fields.description)
            .bind(fields.order_index)
            .bind(updated_at)
            .bind(id.0)
            .fetch_optional(self.pool())
            .await
            .map_err(database_error)?
            .as_ref()
            .map(row_to_section)
            .transpose()
    }

    async fn delete_section(&self, id: SectionId) -> Result<(), RepositoryError> {
        let statements = [
            format!(
                "DELETE FROM \"{}\" WHERE \"{}\" IN (SELECT \"id\" FROM \"{}\" WHERE \"{}\" = $1)",
                LESSON_PROGRESS_TABLE, LESSON_ID_FIELD_NAME, LESSONS_TABLE, SECTION_ID_FIELD_NAME
            ),
            format!(
                "DELETE FROM \"{}\" WHERE \"{}\" = $1",
                LESSONS_TABLE, SECTION_ID_FIELD_NAME
            ),
            format!(
                "DELETE FROM \"{}\" WHERE \"{}\" = $1",
                SECTIONS_TABLE, ID_FIELD_NAME
            ),
        ];
        self.delete_in_transaction(&statements, id.0, "delete section")
            .await
    }

    async fn create_lesson(&self, lesson: &Lesson) -> Result<(), RepositoryError> {
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            LESSONS_TABLE,
            column_list(&LESSON_COLUMNS),
            placeholders(LESSON_COLUMNS.len())
        );
        sqlx::query(&sql)
            .bind(lesson.id.0)
            .bind(lesson.section_id.0)
            .bind(lesson.title.as_ref())
            .bind(&lesson.description)
            .bind(&lesson.content)
            .bind(&lesson.video_url)
            .bind(lesson.video_duration)
            .bind(lesson.order_index)
            .bind(lesson.is_preview)
            .bind(lesson.created_at)
            .bind(lesson.updated_at)
            .execute(self.pool())
            .await
            .map_err(database_error)?;
        Ok(())
    }

    async fn find_lesson(&self, id: LessonId) -> Result<Option<Lesson>, RepositoryError> {
        let (sql, params) = QueryBuilder::from(LESSONS)
            .select(LESSONS.columns(&LESSON_COLUMNS))
            .where_condition(Condition::Equals {
                column: LESSONS.column(ID_FIELD_NAME),
                value: id.0.into(),
            })
            .build();

        bind_all(&sql, params)
            .fetch_optional(self.pool())
            .await
            .map_err(database_error)?
            .as_ref()
            .map(row_to_lesson)
            .transpose()
    }

    async fn update_lesson(
        &self,
        id: LessonId,
        fields: &LessonFields,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Lesson>, RepositoryError> {
        let assigned = [
            TITLE,
            DESCRIPTION,
            CONTENT,
            VIDEO_URL,
            VIDEO_DURATION,
            ORDER_INDEX_FIELD_NAME,
            IS_PREVIEW,
            UPDATED_FIELD_NAME,
        ];
        let set_clause = assigned
            .iter()
            .enumerate()
            .map(|(index, column)| format!("\"{}\" = ${}", column, index + 1))
            .join(", ");
        let sql = format!(
            "UPDATE \"{}\" SET {} WHERE \"{}\" = ${} RETURNING {}",
            LESSONS_TABLE,
            set_clause,
            ID_FIELD_NAME,
            assigned.len() + 1,
            column_list(&LESSON_COLUMNS)
        );
        sqlx::query(&sql)
            .bind(fields.title.as_ref())
            .bind(&fields.description)
            .bind(&fields.content)
            .bind(&fields.video_url)
            .bind(fields.video_duration)
            .bind(fields.order_index)
            .bind(fields.is_preview)
            .bind(updated_at)
            .bind(id.0)
            .fetch_optional(self.pool())
            .await
            .map_err(database_error)?
            .as_ref()
            .map(row_to_lesson)
            .transpose()
    }

    async fn delete_lesson(&self, id: LessonId) -> Result<(), RepositoryError> {
        let statements = [
            format!(
                "DELETE FROM \"{}\" WHERE \"{}\" = $1",
                LESSON_PROGRESS_TABLE, LESSON_ID_FIELD_NAME
            ),
            format!(
                "DELETE FROM \"{}\" WHERE \"{}\" = $1",
                LESSONS_TABLE, ID_FIELD_NAME
            ),
        ];
        self.delete_in_transaction(&statements, id.0, "delete lesson")
            .await
    }

    async fn curriculum(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<CurriculumSection>, RepositoryError> {
        let (sections_sql, sections_params) = QueryBuilder::from(SECTIONS)
            .select(SECTIONS.columns(&SECTION_COLUMNS))
            .where_condition(Condition::Equals {
                column: SECTIONS.column(COURSE_ID_FIELD_NAME),
                value: course_id.0.into(),
            })
            .order_by(SECTIONS.column(ORDER_INDEX_FIELD_NAME), SortDirection::Ascending)
            .order_by(SECTIONS.column(CREATED_FIELD_NAME), SortDirection::Ascending)
            .build();
        let sections = bind_all(&sections_sql, sections_params)
            .fetch_all(self.pool())
            .await
            .map_err(database_error)?
            .iter()
            .map(row_to_section)
            .collect::<Result<Vec<_>, _>>()?;

        let (lessons_sql, lessons_params) = QueryBuilder::from(LESSONS)
            .select(LESSONS.columns(&LESSON_COLUMNS))
            .join(
                JoinType::Inner,
                SECTIONS,
                LESSONS.column(SECTION_ID_FIELD_NAME),
                SECTIONS.column(ID_FIELD_NAME),
            )
            .where_condition(Condition::Equals {
                column: SECTIONS.column(COURSE_ID_FIELD_NAME),
                value: course_id.0.into(),
            })
            .order_by(LESSONS.column(ORDER_INDEX_FIELD_NAME), SortDirection::Ascending)
            .order_by(LESSONS.column(CREATED_FIELD_NAME), SortDirection::Ascending)
            .build();
        let mut lessons_by_section = bind_all(&lessons_sql, lessons_params)
            .fetch_all(self.pool())
            .await
            .map_err(database_error)?
            .iter()
            .map(row_to_lesson)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .into_group_map_by(|lesson| lesson.section_id);

        Ok(sections
            .into_iter()
            .map(|section| CurriculumSection {
                lessons: lessons_by_section.remove(&section.id).unwrap_or_default(),
                section,
            })
            .collect())
    }

    async fn create_enrollment(&self, enrollment: &Enrollment) -> Result<(), RepositoryError> {
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            ENROLLMENTS_TABLE,
            column_list(&ENROLLMENT_COLUMNS),
            placeholders(ENROLLMENT_COLUMNS.len())
        );
        sqlx::query(&sql)
            .bind(enrollment.id.0)
            .bind(enrollment.user_id.as_str())
            .bind(enrollment.course_id.0)
            .bind(enrollment.enrolled_at)
            .bind(enrollment.completed_at)
            .bind(i32::from(enrollment.progress.value()))
            .execute(self.pool())
            .await
            .map_err(database_error)?;
        Ok(())
    }

    async fn find_enrollment(
        &self,
        user_id: &UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, RepositoryError> {
        let (sql, params) = QueryBuilder::from(ENROLLMENTS)
            .select(ENROLLMENTS.columns(&ENROLLMENT_COLUMNS))
            .where_condition(Condition::Equals {
                column: ENROLLMENTS.column(USER_ID_FIELD_NAME),
                value: user_id.as_str().into(),
            })
            .where_condition(Condition::Equals {
                column: ENROLLMENTS.column(COURSE_ID_FIELD_NAME),
                value: course_id.0.into(),
            })
            .build();

        bind_all(&sql, params)
            .fetch_optional(self.pool())
            .await
            .map_err(database_error)?
            .as_ref()
            .map(row_to_enrollment)
            .transpose()
    }

    async fn list_enrollments(&self, user_id: &UserId) -> Result<Vec<Enrollment>, RepositoryError> {
        let (sql, params) = QueryBuilder::from(ENROLLMENTS)
            .select(ENROLLMENTS.columns(&ENROLLMENT_COLUMNS))
            .select_as(COURSES.column(TITLE), COURSE_TITLE)
            .select_as(COURSES.column(SLUG_FIELD_NAME), COURSE_SLUG)
            .select_as(COURSES.column(THUMBNAIL), COURSE_THUMBNAIL)
            .select_as(COURSES.column(LEVEL), COURSE_LEVEL)
            .join(
                JoinType::Inner,
                COURSES,
                ENROLLMENTS.column(COURSE_ID_FIELD_NAME),
                COURSES.column(ID_FIELD_NAME),
            )
            .where_condition(Condition::Equals {
                column: ENROLLMENTS.column(USER_ID_FIELD_NAME),
                value: user_id.as_str().into(),
            })
            .order_by(ENROLLMENTS.column(ENROLLED_AT), SortDirection::Descending)
            .build();
        tracing::debug!("{}", sql);

        bind_all(&sql, params)
            .fetch_all(self.pool())
            .await
            .map_err(database_error)?
            .iter()
            .map(row_to_listed_enrollment)
            .collect()
    }

    async fn update_enrollment_progress(
        &self,
        user_id: &UserId,
        course_id: CourseId,
        progress: Progress,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let sql = format!(
            "UPDATE \"{table}\" SET \"{progress}\" = $1, \"{completed_at}\" = CASE WHEN $1 >= 100 AND \"{completed_at}\" IS NULL THEN $2 ELSE \"{completed_at}\" END WHERE \"{user_id}\" = $3 AND \"{course_id}\" = $4",
            table = ENROLLMENTS_TABLE,
            progress = PROGRESS,
            completed_at = COMPLETED_AT,
            user_id = USER_ID_FIELD_NAME,
            course_id = COURSE_ID_FIELD_NAME,
        );
        sqlx::query(&sql)
            .bind(i32::from(progress.value()))
            .bind(at)
            .bind(user_id.as_str())
            .bind(course_id.0)
            .execute(self.pool())
            .await
            .map_err(database_error)?;
        Ok(())
    }

    async fn complete_lesson(
        &self,
        user_id: &UserId,
        lesson_id: LessonId,
        at: DateTime<Utc>,
    ) -> Result<LessonProgress, RepositoryError> {
        let sql = format!(
            "INSERT INTO \"{table}\" ({columns}) VALUES ($1, $2, $3, TRUE, $4, 0, $4) \
             ON CONFLICT (\"{user_id}\", \"{lesson_id}\") DO UPDATE SET \
             \"{completed}\" = TRUE, \"{completed_at}\" = EXCLUDED.\"{completed_at}\", \
             \"{last_watched_at}\" = EXCLUDED.\"{last_watched_at}\" \
             RETURNING {columns}",
            table = LESSON_PROGRESS_TABLE,
            columns = column_list(&LESSON_PROGRESS_COLUMNS),
            user_id = USER_ID_FIELD_NAME,
            lesson_id = LESSON_ID_FIELD_NAME,
            completed = COMPLETED,
            completed_at = COMPLETED_AT,
            last_watched_at = LAST_WATCHED_AT,
        );
        let row = sqlx::query(&sql)
            .bind(LessonProgressId::generate().0)
            .bind(user_id.as_str())
            .bind(lesson_id.0)
            .bind(at)
            .fetch_one(self.pool())
            .await
            .map_err(database_error)?;
        row_to_lesson_progress(&row)
    }

    async fn find_lesson_progress(
        &self,
        user_id: &UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, RepositoryError> {
        let (sql, params) = QueryBuilder::from(LESSON_PROGRESS)
            .select(LESSON_PROGRESS.columns(&LESSON_PROGRESS_COLUMNS))
            .where_condition(Condition::Equals {
                column: LESSON_PROGRESS.column(USER_ID_FIELD_NAME),
                value: user_id.as_str().into(),
            })
            .where_condition(Condition::Equals {
                column: LESSON_PROGRESS.column(LESSON_ID_FIELD_NAME),
                value: lesson_id.0.into(),
            })
            .build();

        bind_all(&sql, params)
            .fetch_optional(self.pool())
            .await
            .map_err(database_error)?
            .as_ref()
            .map(row_to_lesson_progress)
            .transpose()
    }

    async fn completed_lessons(
        &self,
        user_id: &UserId,
        course_id: CourseId,
    ) -> Result<HashSet<LessonId>, RepositoryError> {
        let (sql, params) = QueryBuilder::from(LESSON_PROGRESS)
            .select(vec![LESSON_PROGRESS.column(LESSON_ID_FIELD_NAME)])
            .join(
                JoinType::Inner,
                LESSONS,
                LESSON_PROGRESS.column(LESSON_ID_FIELD_NAME),
                LESSONS.column(ID_FIELD_NAME),
            )
            .join(
                JoinType::Inner,
                SECTIONS,
                LESSONS.column(SECTION_ID_FIELD_NAME),
                SECTIONS.column(ID_FIELD_NAME),
            )
            .where_condition(Condition::Equals {
                column: LESSON_PROGRESS.column(USER_ID_FIELD_NAME),
                value: user_id.as_str().into(),
            })
            .where_condition(Condition::Equals {
                column: SECTIONS.column(COURSE_ID_FIELD_NAME),
                value: course_id.0.into(),
            })
            .where_condition(Condition::Equals {
                column: LESSON_PROGRESS.column(COMPLETED),
                value: true.into(),
            })
            .build();

        bind_all(&sql, params)
            .fetch_all(self.pool())
            .await
            .map_err(database_error)?
            .iter()
            .map(|row| {
                row.try_get(LESSON_ID_FIELD_NAME)
                    .map(LessonId)
                    .map_err(database_error)
            })
            .collect()
    }

    async fn lesson_tally(
        &self,
        user_id: &UserId,
        course_id: CourseId,
    ) -> Result<LessonTally, RepositoryError> {
        let sql = format!(
            "SELECT COUNT(l.\"id\") AS \"total\", COUNT(p.\"id\") AS \"completed\" \
             FROM \"{lessons}\" AS l \
             JOIN \"{sections}\" AS s ON s.\"id\" = l.\"{section_id}\" \
             LEFT JOIN \"{progress}\" AS p ON p.\"{lesson_id}\" = l.\"id\" AND p.\"{user_id}\" = $1 AND p.\"{completed}\" \
             WHERE s.\"{course_id}\" = $2",
            lessons = LESSONS_TABLE,
            sections = SECTIONS_TABLE,
            section_id = SECTION_ID_FIELD_NAME,
            progress = LESSON_PROGRESS_TABLE,
            lesson_id = LESSON_ID_FIELD_NAME,
            user_id = USER_ID_FIELD_NAME,
            completed = COMPLETED,
            course_id = COURSE_ID_FIELD_NAME,
        );
        let row = sqlx::query(&sql)
            .bind(user_id.as_str())
            .bind(course_id.0)
            .fetch_one(self.pool())
            .await
            .map_err(database_error)?;

        let total: i64 = row.try_get("total").map_err(database_error)?;
        let completed: i64 = row.try_get("completed").map_err(database_error)?;
        Ok(LessonTally {
            completed: u64::try_from(completed).unwrap_or_default(),
            total: u64::try_from(total).unwrap_or_default(),
        })
    }
}

impl PostgresCourseRepository {
    /// Runs DELETE statements sharing one `$1` parameter inside a single transaction.
    async fn delete_in_transaction(
        &self,
        statements: &[String],
        id: uuid::Uuid,
        ctx: &'static str,
    ) -> Result<(), RepositoryError> {
        let mut transaction = self.pool().begin().await.map_err(database_error)?;
        tracing::debug!("{}", ctx);

        for sql in statements {
            tracing::debug!("{}", sql);
            sqlx::query(sql)
                .bind(id)
                .execute(&mut *transaction)
                .await
                .map_err(database_error)?;
        }

        transaction.commit().await.map_err(database_error)
    }
}
