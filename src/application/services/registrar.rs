//! Registrar service
//!
//! One use case per command: course creation and listing, student creation and
//! listing, enrolment, dropping and rosters.

use tracing::{debug, info, instrument};

use crate::application::ApplicationResult;
use crate::domain::{Course, NewCourse, NewStudent, Student};
use crate::infrastructure::RecordStore;

/// Outcome of creating a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentCreated {
    /// Rows inserted
    pub count: usize,
    /// Database-assigned id
    pub id: i64,
}

/// A course together with its enrolled students.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    pub course: Course,
    /// Ordered by last name, first name
    pub students: Vec<Student>,
}

/// Service for record-keeping use cases.
pub struct RegistrarService<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> RegistrarService<'a> {
    /// Create a new registrar service on top of a record store.
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Create a course identified by department, number and section.
    ///
    /// Fails with `DomainError::DuplicateCourse` if the course already exists.
    #[instrument(skip(self))]
    pub fn create_course(
        &self,
        department: &str,
        number: &str,
        section: &str,
    ) -> ApplicationResult<usize> {
        let course = NewCourse {
            department: department.to_string(),
            number: number.to_string(),
            section: section.to_string(),
        };
        let count = self.store.insert_course(&course)?;
        info!("created course {department} {number}-{section}");
        Ok(count)
    }

    pub fn list_courses(&self) -> ApplicationResult<Vec<Course>> {
        let courses = self.store.list_courses()?;
        debug!("list_courses: {} rows", courses.len());
        Ok(courses)
    }

    /// Create a student; the id is assigned by the database.
    #[instrument(skip(self))]
    pub fn create_student(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> ApplicationResult<StudentCreated> {
        let student = NewStudent {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        };
        let (count, id) = self.store.insert_student(&student)?;
        info!("created student {id}: {last_name}, {first_name}");
        Ok(StudentCreated { count, id })
    }

    pub fn list_students(&self) -> ApplicationResult<Vec<Student>> {
        let students = self.store.list_students()?;
        debug!("list_students: {} rows", students.len());
        Ok(students)
    }

    /// Enrol a student in a course.
    ///
    /// Fails with `StudentNotFound`, `CourseNotFound` or `DuplicateEnrolment`.
    #[instrument(skip(self))]
    pub fn enroll_student(&self, student_id: i64, course_id: i64) -> ApplicationResult<usize> {
        let count = self.store.enroll(student_id, course_id)?;
        info!("enrolled student {student_id} in course {course_id}");
        Ok(count)
    }

    /// Drop a student from a course. Fails with `NotEnrolled` if there is nothing to drop.
    #[instrument(skip(self))]
    pub fn drop_student(&self, student_id: i64, course_id: i64) -> ApplicationResult<usize> {
        let count = self.store.drop_enrolment(student_id, course_id)?;
        info!("dropped student {student_id} from course {course_id}");
        Ok(count)
    }

    /// Students enrolled in a course. Fails with `CourseNotFound`.
    #[instrument(skip(self))]
    pub fn course_roster(&self, course_id: i64) -> ApplicationResult<Roster> {
        let (course, students) = self.store.roster(course_id)?;
        debug!("course_roster: {} students in {}", students.len(), course.code());
        Ok(Roster { course, students })
    }
}
