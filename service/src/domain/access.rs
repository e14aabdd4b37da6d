use crate::domain::course::CurriculumSection;

/// How much of a curriculum a viewer may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseAccess {
    Full,
    /// Only lessons flagged as preview; sections stay, possibly empty.
    PreviewOnly,
}

impl CourseAccess {
    pub fn for_viewer(is_enrolled: bool, is_free: bool) -> Self {
        if is_enrolled || is_free {
            CourseAccess::Full
        } else {
            CourseAccess::PreviewOnly
        }
    }

    pub fn apply(self, sections: Vec<CurriculumSection>) -> Vec<CurriculumSection> {
        match self {
            CourseAccess::Full => sections,
            CourseAccess::PreviewOnly => sections
                .into_iter()
                .map(|mut section| {
                    section.lessons.retain(|lesson| lesson.is_preview);
                    section
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::course::{CourseId, Lesson, LessonFields, Section, SectionFields, Title};

    fn section(title: &str, lessons: &[(&str, bool)]) -> CurriculumSection {
        let now = Utc::now();
        let section = Section::new(
            CourseId::generate(),
            SectionFields {
                title: Title::try_new(title).unwrap(),
                description: String::new(),
                order_index: 0,
            },
            now,
        );
        let lessons = lessons
            .iter()
            .enumerate()
            .map(|(index, (title, is_preview))| {
                Lesson::new(
                    section.id,
                    LessonFields {
                        title: Title::try_new(*title).unwrap(),
                        description: String::new(),
                        content: String::new(),
                        video_url: String::new(),
                        video_duration: 60,
                        order_index: index as i32,
                        is_preview: *is_preview,
                    },
                    now,
                )
            })
            .collect();
        CurriculumSection { section, lessons }
    }

    fn curriculum() -> Vec<CurriculumSection> {
        vec![
            section("A", &[("L1", true), ("L2", false)]),
            section("B", &[("L3", false)]),
        ]
    }

    #[test]
    fn outsiders_of_paid_courses_see_previews_only() {
        let visible = CourseAccess::for_viewer(false, false).apply(curriculum());

        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].lessons.len(), 1);
        assert_eq!(visible[0].lessons[0].title.as_ref(), "L1");
        assert!(visible[1].lessons.is_empty());
    }

    #[test]
    fn enrolled_viewers_see_everything() {
        let visible = CourseAccess::for_viewer(true, false).apply(curriculum());
        assert_eq!(visible.iter().map(|s| s.lessons.len()).sum::<usize>(), 3);
    }

    #[test]
    fn free_courses_are_open_to_everyone() {
        assert_eq!(CourseAccess::for_viewer(false, true), CourseAccess::Full);
        let visible = CourseAccess::Full.apply(curriculum());
        assert_eq!(visible.iter().map(|s| s.lessons.len()).sum::<usize>(), 3);
    }
}
