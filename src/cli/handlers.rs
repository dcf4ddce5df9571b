//! One handler per command
//!
//! Handlers check their positional arguments before touching the store, call
//! the registrar service, and write the result to the context's output.

use std::io::Write;

use tracing::instrument;

use crate::application::format;
use crate::application::services::RegistrarService;
use crate::cli::dispatch::{usage, CommandContext, Handler};
use crate::cli::{CliError, CliResult};

/// Every command in usage order.
pub static ALL: &[&dyn Handler] = &[
    &Help,
    &CreateCourse,
    &ListCourses,
    &CreateStudent,
    &ListStudents,
    &EnrollStudent,
    &DropStudent,
    &CourseRoster,
];

/// Require exactly `N` positional arguments.
fn expect_args<'a, const N: usize>(
    command: &'static str,
    args: &'a [String],
    expected: &'static str,
) -> CliResult<&'a [String; N]> {
    <&[String; N]>::try_from(args).map_err(|_| CliError::ArgumentCount { command, expected })
}

/// Parse a numeric record id.
fn parse_id(name: &'static str, value: &str) -> CliResult<i64> {
    value.parse().map_err(|_| CliError::InvalidArgument {
        name,
        value: value.to_string(),
    })
}

pub struct Help;

impl Handler for Help {
    fn name(&self) -> &'static str {
        "help"
    }

    fn synopsis(&self) -> &'static str {
        ""
    }

    fn run(&self, ctx: &mut CommandContext<'_>, _args: &[String]) -> CliResult<()> {
        write!(ctx.out, "{}", usage(ctx.program))?;
        Ok(())
    }
}

pub struct CreateCourse;

impl Handler for CreateCourse {
    fn name(&self) -> &'static str {
        "createCourse"
    }

    fn synopsis(&self) -> &'static str {
        "department number   section"
    }

    #[instrument(name = "createCourse", skip_all)]
    fn run(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> CliResult<()> {
        let [department, number, section] = expect_args::<3>(
            self.name(),
            args,
            "three arguments (department, course number, and section)",
        )?;
        let count = RegistrarService::new(ctx.store).create_course(department, number, section)?;
        writeln!(ctx.out, "{count} course(s) created.")?;
        Ok(())
    }
}

pub struct ListCourses;

impl Handler for ListCourses {
    fn name(&self) -> &'static str {
        "listCourses"
    }

    fn synopsis(&self) -> &'static str {
        ""
    }

    #[instrument(name = "listCourses", skip_all)]
    fn run(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> CliResult<()> {
        expect_args::<0>(self.name(), args, "no arguments")?;
        let courses = RegistrarService::new(ctx.store).list_courses()?;
        write!(ctx.out, "{}", format::courses_table(&courses))?;
        Ok(())
    }
}

pub struct CreateStudent;

impl Handler for CreateStudent {
    fn name(&self) -> &'static str {
        "createStudent"
    }

    fn synopsis(&self) -> &'static str {
        "firstName  lastName"
    }

    #[instrument(name = "createStudent", skip_all)]
    fn run(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> CliResult<()> {
        let [first_name, last_name] = expect_args::<2>(
            self.name(),
            args,
            "two arguments (first name and last name)",
        )?;
        let created = RegistrarService::new(ctx.store).create_student(first_name, last_name)?;
        writeln!(
            ctx.out,
            "{} student(s) created (id {}).",
            created.count, created.id
        )?;
        Ok(())
    }
}

pub struct ListStudents;

impl Handler for ListStudents {
    fn name(&self) -> &'static str {
        "listStudents"
    }

    fn synopsis(&self) -> &'static str {
        ""
    }

    #[instrument(name = "listStudents", skip_all)]
    fn run(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> CliResult<()> {
        expect_args::<0>(self.name(), args, "no arguments")?;
        let students = RegistrarService::new(ctx.store).list_students()?;
        write!(ctx.out, "{}", format::students_table(&students))?;
        Ok(())
    }
}

pub struct EnrollStudent;

impl Handler for EnrollStudent {
    fn name(&self) -> &'static str {
        "enrollStudent"
    }

    fn synopsis(&self) -> &'static str {
        "studentId  courseId"
    }

    #[instrument(name = "enrollStudent", skip_all)]
    fn run(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> CliResult<()> {
        let [student_id, course_id] =
            expect_args::<2>(self.name(), args, "two arguments (student id and course id)")?;
        let student_id = parse_id("student id", student_id)?;
        let course_id = parse_id("course id", course_id)?;
        let count = RegistrarService::new(ctx.store).enroll_student(student_id, course_id)?;
        writeln!(ctx.out, "{count} enrolment(s) created.")?;
        Ok(())
    }
}

pub struct DropStudent;

impl Handler for DropStudent {
    fn name(&self) -> &'static str {
        "dropStudent"
    }

    fn synopsis(&self) -> &'static str {
        "studentId  courseId"
    }

    #[instrument(name = "dropStudent", skip_all)]
    fn run(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> CliResult<()> {
        let [student_id, course_id] =
            expect_args::<2>(self.name(), args, "two arguments (student id and course id)")?;
        let student_id = parse_id("student id", student_id)?;
        let course_id = parse_id("course id", course_id)?;
        let count = RegistrarService::new(ctx.store).drop_student(student_id, course_id)?;
        writeln!(ctx.out, "{count} enrolment(s) removed.")?;
        Ok(())
    }
}

pub struct CourseRoster;

impl Handler for CourseRoster {
    fn name(&self) -> &'static str {
        "courseRoster"
    }

    fn synopsis(&self) -> &'static str {
        "courseId"
    }

    #[instrument(name = "courseRoster", skip_all)]
    fn run(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> CliResult<()> {
        let [course_id] = expect_args::<1>(self.name(), args, "one argument (course id)")?;
        let course_id = parse_id("course id", course_id)?;
        let roster = RegistrarService::new(ctx.store).course_roster(course_id)?;
        write!(ctx.out, "{}", format::roster_table(&roster))?;
        Ok(())
    }
}
