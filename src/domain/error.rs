//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violated record-keeping rules.
/// These are independent of how the records are stored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("course already exists: {department} {number}-{section}")]
    DuplicateCourse {
        department: String,
        number: String,
        section: String,
    },

    #[error("student {student_id} is already enrolled in course {course_id}")]
    DuplicateEnrolment { student_id: i64, course_id: i64 },

    #[error("student not found: {0}")]
    StudentNotFound(i64),

    #[error("course not found: {0}")]
    CourseNotFound(i64),

    #[error("student {student_id} is not enrolled in course {course_id}")]
    NotEnrolled { student_id: i64, course_id: i64 },
}
