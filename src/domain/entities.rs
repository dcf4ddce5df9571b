//! Domain entities: row-shaped records
//!
//! Records carry no behavior beyond presentation helpers. Identifiers are
//! always assigned by the database.

/// A registered student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl Student {
    /// "Last, First" as shown in listings and rosters.
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// Student data before the database assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
}

/// A teacher who may be assigned to courses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teacher {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// A course offering.
///
/// Identity is `(department, number, section)`; the remaining attributes are
/// optional scheduling details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: i64,
    pub department: String,
    pub number: String,
    pub section: String,
    pub title: Option<String>,
    pub teacher_id: Option<i64>,
    pub semester: Option<String>,
    pub year: Option<i32>,
}

impl Course {
    /// Short code, e.g. `CS 101-A`.
    pub fn code(&self) -> String {
        format!("{} {}-{}", self.department, self.number, self.section)
    }
}

/// Course identity before the database assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub department: String,
    pub number: String,
    pub section: String,
}

/// A question posed in a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: i64,
    pub text: String,
    pub course_id: i64,
    pub responses: i64,
}

/// A selectable answer to a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub id: i64,
    pub text: String,
    pub question_id: i64,
    pub selections: i64,
}

/// Registration of a student in a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrolment {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_student_when_display_name_then_last_name_first() {
        let student = Student {
            id: 7,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        };
        assert_eq!(student.display_name(), "Lovelace, Ada");
    }

    #[test]
    fn given_course_when_code_then_joins_identity_fields() {
        let course = Course {
            id: 1,
            department: "CS".into(),
            number: "101".into(),
            section: "A".into(),
            title: None,
            teacher_id: None,
            semester: None,
            year: None,
        };
        assert_eq!(course.code(), "CS 101-A");
    }
}
