use thiserror::Error;

use crate::domain::repository::RepositoryError;

/// Coarse classification used by the transport layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidState,
    Unauthenticated,
    Forbidden,
    Timeout,
    Cancelled,
    Internal,
}

#[derive(Debug, Error)]
pub enum CourseError {
    #[error("course not found")]
    CourseNotFound,
    #[error("section not found")]
    SectionNotFound,
    #[error("lesson not found")]
    LessonNotFound,
    #[error("not enrolled in this course")]
    NotEnrolled,
    #[error("already enrolled in this course")]
    AlreadyEnrolled,
    #[error("a course with slug '{0}' already exists")]
    DuplicateSlug(String),
    #[error("course is not published")]
    CourseNotPublished,
    #[error("payment required for this course")]
    PaymentRequired,
    #[error("invalid level '{0}': expected beginner, intermediate or advanced")]
    InvalidLevel(String),
    #[error("invalid status '{0}': expected draft or published")]
    InvalidStatus(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("authentication required")]
    Unauthenticated,
    #[error("insufficient permissions")]
    Forbidden,
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },
    #[error("{operation} was cancelled")]
    Cancelled { operation: &'static str },
    #[error("{operation} failed")]
    Store {
        operation: &'static str,
        #[source]
        source: RepositoryError,
    },
}

impl CourseError {
    pub fn kind(&self) -> ErrorKind {
        use CourseError::*;

        match self {
            CourseNotFound | SectionNotFound | LessonNotFound | NotEnrolled => ErrorKind::NotFound,
            AlreadyEnrolled | DuplicateSlug(_) => ErrorKind::Conflict,
            CourseNotPublished | PaymentRequired | InvalidLevel(_) | InvalidStatus(_)
            | InvalidInput(_) => ErrorKind::InvalidState,
            Unauthenticated => ErrorKind::Unauthenticated,
            Forbidden => ErrorKind::Forbidden,
            Timeout { .. } => ErrorKind::Timeout,
            Cancelled { .. } => ErrorKind::Cancelled,
            Store { .. } => ErrorKind::Internal,
        }
    }

    pub(crate) fn store(operation: &'static str) -> impl FnOnce(RepositoryError) -> CourseError {
        move |source| CourseError::Store { operation, source }
    }

    pub(crate) fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            CourseError::Store {
                source: RepositoryError::UniqueViolation(_),
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_are_internal() {
        let error = CourseError::store("load course")(RepositoryError::DatabaseError(
            "connection reset".to_string(),
        ));

        assert_eq!(error.kind(), ErrorKind::Internal);
        assert_eq!(error.to_string(), "load course failed");
        assert!(!error.is_unique_violation());
    }

    #[test]
    fn enrollment_errors_are_classified() {
        assert_eq!(CourseError::NotEnrolled.kind(), ErrorKind::NotFound);
        assert_eq!(CourseError::AlreadyEnrolled.kind(), ErrorKind::Conflict);
        assert_eq!(CourseError::PaymentRequired.kind(), ErrorKind::InvalidState);
        assert_eq!(
            CourseError::Timeout { operation: "enroll" }.kind(),
            ErrorKind::Timeout
        );
    }
}
