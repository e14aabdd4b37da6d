use crate::domain::course::{CourseLevel, CourseOverview, UserId};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Filter and page of a course listing.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseQuery {
    /// Hide drafts.
    pub published_only: bool,
    pub level: Option<CourseLevel>,
    pub is_free: Option<bool>,
    pub instructor_id: Option<UserId>,
    /// Case-insensitive substring of title or description.
    pub search: Option<String>,
    page: u32,
    limit: u32,
}

impl CourseQuery {
    /// Out of range values fall back to page 1 and the default page size;
    /// the page size is capped at [`MAX_PAGE_SIZE`].
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        let limit = match limit {
            Some(0) | None => DEFAULT_PAGE_SIZE,
            Some(limit) => limit.min(MAX_PAGE_SIZE),
        };
        Self {
            published_only: true,
            level: None,
            is_free: None,
            instructor_id: None,
            search: None,
            page,
            limit,
        }
    }

    pub fn including_drafts(mut self) -> Self {
        self.published_only = false;
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for CourseQuery {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoursePage {
    pub courses: Vec<CourseOverview>,
    /// Matching courses across all pages.
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl CoursePage {
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.limit.max(1)))
    }
}
