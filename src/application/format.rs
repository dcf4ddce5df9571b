//! Plain-text tables for listings

use std::fmt::Write;

use crate::application::services::registrar::Roster;
use crate::domain::{Course, Student};

const RULE: &str = "--------------------------------";

/// Student table: header, rule, one `ID   Last, First` line per student.
pub fn students_table(students: &[Student]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ID   Last name, First name");
    let _ = writeln!(out, "{RULE}");
    for student in students {
        let _ = writeln!(out, "{:<4} {}", student.id, student.display_name());
    }
    out
}

/// Course table: header, rule, one `ID   DEPT NUMBER-SECTION` line per course.
pub fn courses_table(courses: &[Course]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ID   Course");
    let _ = writeln!(out, "{RULE}");
    for course in courses {
        let _ = write!(out, "{:<4} {}", course.id, course.code());
        if let Some(title) = &course.title {
            let _ = write!(out, "  {title}");
        }
        match (&course.semester, course.year) {
            (Some(semester), Some(year)) => {
                let _ = write!(out, " ({semester} {year})");
            }
            (Some(semester), None) => {
                let _ = write!(out, " ({semester})");
            }
            (None, Some(year)) => {
                let _ = write!(out, " ({year})");
            }
            (None, None) => {}
        }
        out.push('\n');
    }
    out
}

/// Roster: title line followed by the student table.
pub fn roster_table(roster: &Roster) -> String {
    format!(
        "Roster for {}\n{}",
        roster.course.code(),
        students_table(&roster.students)
    )
}
