use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use chrono::{DateTime, Utc};
use lectern_common::Slug;

use crate::domain::{
    context::{Actor, RequestContext, Role},
    course::{
        Course, CourseChanges, CourseId, CourseLevel, CourseOverview, CourseStatus,
        CurriculumSection, EnrolledCourse, Enrollment, Lesson, LessonFields, LessonId,
        LessonProgress, LessonProgressId, LessonTally, Progress, Section, SectionFields,
        SectionId, Title, UserId,
    },
    repository::{CoursePage, CourseQuery, CourseRepository, RepositoryError},
};

#[derive(Default)]
struct Tables {
    courses: Vec<Course>,
    sections: Vec<Section>,
    lessons: Vec<Lesson>,
    enrollments: Vec<Enrollment>,
    progress: Vec<LessonProgress>,
}

#[derive(Default)]
struct Behaviour {
    latency: Option<Duration>,
    fail_progress_writes: bool,
    fail_tally: bool,
}

/// In-memory store with the same ordering, uniqueness and cascade rules as the database.
#[derive(Clone, Default)]
pub struct InMemoryCourseRepository {
    tables: Arc<Mutex<Tables>>,
    behaviour: Arc<Mutex<Behaviour>>,
}

impl InMemoryCourseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long before touching the tables.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.behaviour.lock().unwrap().latency = Some(latency);
        self
    }

    pub fn fail_progress_writes(&self) {
        self.behaviour.lock().unwrap().fail_progress_writes = true;
    }

    pub fn fail_tally(&self) {
        self.behaviour.lock().unwrap().fail_tally = true;
    }

    pub fn progress_rows(&self) -> usize {
        self.tables.lock().unwrap().progress.len()
    }

    pub fn enrollment_rows(&self) -> usize {
        self.tables.lock().unwrap().enrollments.len()
    }

    async fn tables(&self) -> MutexGuard<'_, Tables> {
        let latency = self.behaviour.lock().unwrap().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.tables.lock().unwrap()
    }

    fn overview(tables: &Tables, course: &Course) -> CourseOverview {
        let lessons = Self::course_lessons(tables, course.id);
        CourseOverview {
            course: course.clone(),
            total_lessons: lessons.len() as u32,
            total_duration: lessons
                .iter()
                .map(|lesson| lesson.video_duration.max(0) as u64)
                .sum(),
        }
    }

    fn course_lessons(tables: &Tables, course_id: CourseId) -> Vec<&Lesson> {
        let sections: HashSet<SectionId> = tables
            .sections
            .iter()
            .filter(|s| s.course_id == course_id)
            .map(|s| s.id)
            .collect();
        tables
            .lessons
            .iter()
            .filter(|l| sections.contains(&l.section_id))
            .collect()
    }

    fn remove_sections(tables: &mut Tables, ids: &HashSet<SectionId>) {
        let lessons: HashSet<LessonId> = tables
            .lessons
            .iter()
            .filter(|l| ids.contains(&l.section_id))
            .map(|l| l.id)
            .collect();
        tables.progress.retain(|p| !lessons.contains(&p.lesson_id));
        tables.lessons.retain(|l| !lessons.contains(&l.id));
        tables.sections.retain(|s| !ids.contains(&s.id));
    }
}

impl CourseRepository for InMemoryCourseRepository {
    async fn create_course(&self, course: &Course) -> Result<(), RepositoryError> {
        let mut tables = self.tables().await;
        if tables.courses.iter().any(|c| c.slug == course.slug) {
            return Err(RepositoryError::UniqueViolation(
                "courses_slug_key".to_string(),
            ));
        }
        tables.courses.push(course.clone());
        Ok(())
    }

    async fn find_course(&self, id: CourseId) -> Result<Option<CourseOverview>, RepositoryError> {
        let tables = self.tables().await;
        Ok(tables
            .courses
            .iter()
            .find(|c| c.id == id)
            .map(|c| Self::overview(&tables, c)))
    }

    async fn find_course_by_slug(
        &self,
        slug: &Slug,
    ) -> Result<Option<CourseOverview>, RepositoryError> {
        let tables = self.tables().await;
        Ok(tables
            .courses
            .iter()
            .find(|c| &c.slug == slug)
            .map(|c| Self::overview(&tables, c)))
    }

    async fn list_courses(&self, query: &CourseQuery) -> Result<CoursePage, RepositoryError> {
        let tables = self.tables().await;
        let search = query.search.as_ref().map(|s| s.to_lowercase());
        let mut matching: Vec<&Course> = tables
            .courses
            .iter()
            .filter(|c| !query.published_only || c.is_published())
            .filter(|c| query.level.is_none_or(|level| c.level == level))
            .filter(|c| query.is_free.is_none_or(|is_free| c.is_free == is_free))
            .filter(|c| {
                query
                    .instructor_id
                    .as_ref()
                    .is_none_or(|instructor| &c.instructor_id == instructor)
            })
            .filter(|c| {
                search.as_ref().is_none_or(|needle| {
                    c.title.as_ref().to_lowercase().contains(needle)
                        || c.description.to_lowercase().contains(needle)
                })
            })
            .collect();
        // newest first, later insertions win ties
        matching.reverse();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let courses = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .map(|c| Self::overview(&tables, c))
            .collect();

        Ok(CoursePage {
            courses,
            total,
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
        let mut tables = self.tables().await;
        let slug_taken = changes
            .slug
            .as_ref()
            .is_some_and(|slug| tables.courses.iter().any(|c| c.id != id && &c.slug == slug));
        if slug_taken {
            return Err(RepositoryError::UniqueViolation(
                "courses_slug_key".to_string(),
            ));
        }
        let Some(course) = tables.courses.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            course.title = title.clone();
        }
        if let Some(slug) = &changes.slug {
            course.slug = slug.clone();
        }
        if let Some(description) = &changes.description {
            course.description = description.clone();
        }
        if let Some(thumbnail) = &changes.thumbnail {
            course.thumbnail = thumbnail.clone();
        }
        if let Some(price) = changes.price {
            course.price = price;
        }
        if let Some(is_free) = changes.is_free {
            course.is_free = is_free;
        }
        if let Some(level) = changes.level {
            course.level = level;
        }
        if let Some(status) = changes.status {
            course.status = status;
        }
        course.updated_at = updated_at;
        Ok(Some(course.clone()))
    }

    async fn delete_course(&self, id: CourseId) -> Result<(), RepositoryError> {
        let mut tables = self.tables().await;
        let sections: HashSet<SectionId> = tables
            .sections
            .iter()
            .filter(|s| s.course_id == id)
            .map(|s| s.id)
            .collect();
        Self::remove_sections(&mut tables, &sections);
        tables.enrollments.retain(|e| e.course_id != id);
        tables.courses.retain(|c| c.id != id);
        Ok(())
    }

    async fn create_section(&self, section: &Section) -> Result<(), RepositoryError> {
        self.tables().await.sections.push(section.clone());
        Ok(())
    }

    async fn find_section(&self, id: SectionId) -> Result<Option<Section>, RepositoryError> {
        let tables = self.tables().await;
        Ok(tables.sections.iter().find(|s| s.id == id).cloned())
    }

    async fn update_section(
        &self,
        id: SectionId,
        fields: &SectionFields,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Section>, RepositoryError> {
        let mut tables = self.tables().await;
        Ok(tables.sections.iter_mut().find(|s| s.id == id).map(|s| {
            s.title = fields.title.clone();
            s.description = fields.description.clone();
            s.order_index = fields.order_index;
            s.updated_at = updated_at;
            s.clone()
        }))
    }

    async fn delete_section(&self, id: SectionId) -> Result<(), RepositoryError> {
        let mut tables = self.tables().await;
        Self::remove_sections(&mut tables, &HashSet::from([id]));
        Ok(())
    }

    async fn create_lesson(&self, lesson: &Lesson) -> Result<(), RepositoryError> {
        self.tables().await.lessons.push(lesson.clone());
        Ok(())
    }

    async fn find_lesson(&self, id: LessonId) -> Result<Option<Lesson>, RepositoryError> {
        let tables = self.tables().await;
        Ok(tables.lessons.iter().find(|l| l.id == id).cloned())
    }

    async fn update_lesson(
        &self,
        id: LessonId,
        fields: &LessonFields,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Lesson>, RepositoryError> {
        let mut tables = self.tables().await;
        Ok(tables.lessons.iter_mut().find(|l| l.id == id).map(|l| {
            l.title = fields.title.clone();
            l.description = fields.description.clone();
            l.content = fields.content.clone();
            l.video_url = fields.video_url.clone();
            l.video_duration = fields.video_duration;
            l.order_index = fields.order_index;
            l.is_preview = fields.is_preview;
            l.updated_at = updated_at;
            l.clone()
        }))
    }

    async fn delete_lesson(&self, id: LessonId) -> Result<(), RepositoryError> {
        let mut tables = self.tables().await;
        tables.progress.retain(|p| p.lesson_id != id);
        tables.lessons.retain(|l| l.id != id);
        Ok(())
    }

    async fn curriculum(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<CurriculumSection>, RepositoryError> {
        let tables = self.tables().await;
        let mut sections: Vec<&Section> = tables
            .sections
            .iter()
            .filter(|s| s.course_id == course_id)
            .collect();
        // stable sort keeps insertion order for equal indices
        sections.sort_by_key(|s| s.order_index);

        Ok(sections
            .into_iter()
            .map(|section| {
                let mut lessons: Vec<Lesson> = tables
                    .lessons
                    .iter()
                    .filter(|l| l.section_id == section.id)
                    .cloned()
                    .collect();
                lessons.sort_by_key(|l| l.order_index);
                CurriculumSection {
                    section: section.clone(),
                    lessons,
                }
            })
            .collect())
    }

    async fn create_enrollment(&self, enrollment: &Enrollment) -> Result<(), RepositoryError> {
        let mut tables = self.tables().await;
        if tables
            .enrollments
            .iter()
            .any(|e| e.user_id == enrollment.user_id && e.course_id == enrollment.course_id)
        {
            return Err(RepositoryError::UniqueViolation(
                "enrollments_user_id_course_id_key".to_string(),
            ));
        }
        tables.enrollments.push(enrollment.clone());
        Ok(())
    }

    async fn find_enrollment(
        &self,
        user_id: &UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, RepositoryError> {
        let tables = self.tables().await;
        Ok(tables
            .enrollments
            .iter()
            .find(|e| &e.user_id == user_id && e.course_id == course_id)
            .cloned())
    }

    async fn list_enrollments(&self, user_id: &UserId) -> Result<Vec<Enrollment>, RepositoryError> {
        let tables = self.tables().await;
        let mut enrollments: Vec<Enrollment> = tables
            .enrollments
            .iter()
            .rev()
            .filter(|e| &e.user_id == user_id)
            .filter_map(|e| {
                let course = tables.courses.iter().find(|c| c.id == e.course_id)?;
                let mut enrollment = e.clone();
                enrollment.course = Some(EnrolledCourse {
                    title: course.title.clone(),
                    slug: course.slug.clone(),
                    thumbnail: course.thumbnail.clone(),
                    level: course.level,
                });
                Some(enrollment)
            })
            .collect();
        enrollments.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));
        Ok(enrollments)
    }

    async fn update_enrollment_progress(
        &self,
        user_id: &UserId,
        course_id: CourseId,
        progress: Progress,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        if self.behaviour.lock().unwrap().fail_progress_writes {
            return Err(RepositoryError::DatabaseError(
                "progress write rejected".to_string(),
            ));
        }
        let mut tables = self.tables().await;
        if let Some(enrollment) = tables
            .enrollments
            .iter_mut()
            .find(|e| &e.user_id == user_id && e.course_id == course_id)
        {
            enrollment.progress = progress;
            if progress.is_complete() && enrollment.completed_at.is_none() {
                enrollment.completed_at = Some(at);
            }
        }
        Ok(())
    }

    async fn complete_lesson(
        &self,
        user_id: &UserId,
        lesson_id: LessonId,
        at: DateTime<Utc>,
    ) -> Result<LessonProgress, RepositoryError> {
        let mut tables = self.tables().await;
        if let Some(row) = tables
            .progress
            .iter_mut()
            .find(|p| &p.user_id == user_id && p.lesson_id == lesson_id)
        {
            row.completed = true;
            row.completed_at = Some(at);
            row.last_watched_at = Some(at);
            return Ok(row.clone());
        }
        let row = LessonProgress {
            id: LessonProgressId::generate(),
            user_id: user_id.clone(),
            lesson_id,
            completed: true,
            completed_at: Some(at),
            watch_duration: 0,
            last_watched_at: Some(at),
        };
        tables.progress.push(row.clone());
        Ok(row)
    }

    async fn find_lesson_progress(
        &self,
        user_id: &UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, RepositoryError> {
        let tables = self.tables().await;
        Ok(tables
            .progress
            .iter()
            .find(|p| &p.user_id == user_id && p.lesson_id == lesson_id)
            .cloned())
    }

    async fn completed_lessons(
        &self,
        user_id: &UserId,
        course_id: CourseId,
    ) -> Result<HashSet<LessonId>, RepositoryError> {
        let tables = self.tables().await;
        let lessons: HashSet<LessonId> = Self::course_lessons(&tables, course_id)
            .into_iter()
            .map(|l| l.id)
            .collect();
        Ok(tables
            .progress
            .iter()
            .filter(|p| &p.user_id == user_id && p.completed && lessons.contains(&p.lesson_id))
            .map(|p| p.lesson_id)
            .collect())
    }

    async fn lesson_tally(
        &self,
        user_id: &UserId,
        course_id: CourseId,
    ) -> Result<LessonTally, RepositoryError> {
        if self.behaviour.lock().unwrap().fail_tally {
            return Err(RepositoryError::DatabaseError(
                "lesson count rejected".to_string(),
            ));
        }
        let tables = self.tables().await;
        let lessons = Self::course_lessons(&tables, course_id);
        let completed = lessons
            .iter()
            .filter(|l| {
                tables
                    .progress
                    .iter()
                    .any(|p| &p.user_id == user_id && p.lesson_id == l.id && p.completed)
            })
            .count();
        Ok(LessonTally {
            completed: completed as u64,
            total: lessons.len() as u64,
        })
    }
}

pub fn admin() -> RequestContext {
    RequestContext::for_actor(Actor::new(UserId::new("admin-1"), Role::Admin))
}

pub fn student(user_id: &str) -> RequestContext {
    RequestContext::for_actor(Actor::new(UserId::new(user_id), Role::Student))
}

pub fn title(value: &str) -> Title {
    Title::try_new(value).unwrap()
}

/// Seeds a course directly into the store.
pub async fn seed_course(
    repository: &InMemoryCourseRepository,
    name: &str,
    status: CourseStatus,
    is_free: bool,
) -> Course {
    let now = Utc::now();
    let course = Course {
        id: CourseId::generate(),
        title: title(name),
        slug: Slug::from_title(name).unwrap(),
        description: format!("About {}", name),
        thumbnail: String::new(),
        price: if is_free { 0.0 } else { 49.0 },
        is_free,
        level: CourseLevel::Beginner,
        status,
        instructor_id: UserId::new("instructor-1"),
        created_at: now,
        updated_at: now,
    };
    repository.create_course(&course).await.unwrap();
    course
}

pub async fn seed_section(
    repository: &InMemoryCourseRepository,
    course_id: CourseId,
    name: &str,
    order_index: i32,
) -> Section {
    let section = Section::new(
        course_id,
        SectionFields {
            title: title(name),
            description: String::new(),
            order_index,
        },
        Utc::now(),
    );
    repository.create_section(&section).await.unwrap();
    section
}

pub async fn seed_lesson(
    repository: &InMemoryCourseRepository,
    section_id: SectionId,
    name: &str,
    order_index: i32,
    is_preview: bool,
) -> Lesson {
    let lesson = Lesson::new(
        section_id,
        LessonFields {
            title: title(name),
            description: String::new(),
            content: String::new(),
            video_url: String::new(),
            video_duration: 60,
            order_index,
            is_preview,
        },
        Utc::now(),
    );
    repository.create_lesson(&lesson).await.unwrap();
    lesson
}

pub async fn seed_enrollment(
    repository: &InMemoryCourseRepository,
    user_id: &str,
    course_id: CourseId,
) -> Enrollment {
    let enrollment = Enrollment::new(UserId::new(user_id), course_id, Utc::now());
    repository.create_enrollment(&enrollment).await.unwrap();
    enrollment
}
