//! Data access boundary trait
//!
//! Services depend on this trait rather than on SQLite, so command handling
//! can be tested with recording implementations.

use crate::domain::{Course, NewCourse, NewStudent, Student};
use crate::infrastructure::InfraResult;

/// Record store abstraction.
///
/// Every method is one logical database operation. Failures are already
/// classified: constraint violations and missing references arrive as
/// `InfraError::Domain`, everything else as a transport error.
pub trait RecordStore {
    /// Insert a course. Returns the number of rows inserted.
    fn insert_course(&self, course: &NewCourse) -> InfraResult<usize>;

    /// All courses ordered by id.
    fn list_courses(&self) -> InfraResult<Vec<Course>>;

    /// Insert a student. Returns the inserted row count and the generated id.
    fn insert_student(&self, student: &NewStudent) -> InfraResult<(usize, i64)>;

    /// All students ordered by id.
    fn list_students(&self) -> InfraResult<Vec<Student>>;

    /// Enrol a student in a course. Returns the number of rows inserted.
    fn enroll(&self, student_id: i64, course_id: i64) -> InfraResult<usize>;

    /// Remove an enrolment. Returns the number of rows deleted.
    fn drop_enrolment(&self, student_id: i64, course_id: i64) -> InfraResult<usize>;

    /// The course and its enrolled students ordered by name.
    fn roster(&self, course_id: i64) -> InfraResult<(Course, Vec<Student>)>;
}
