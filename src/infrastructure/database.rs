//! SQLite-backed record store
//!
//! The connection is opened lazily on the first statement, so commands that
//! never touch the database (`help`) work without one. Every operation runs
//! under a statement deadline enforced through SQLite's progress handler.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use once_cell::unsync::OnceCell;
use rusqlite::{ffi, params, Connection, ErrorCode, OpenFlags, OptionalExtension, Row};
use tracing::{debug, instrument};

use crate::config::DatabaseSettings;
use crate::domain::{
    Answer, Course, DomainError, Enrolment, NewCourse, NewStudent, Question, Student, Teacher,
};
use crate::infrastructure::{InfraError, InfraResult, RecordStore};

/// Number of SQLite virtual machine instructions between deadline checks.
const PROGRESS_OPS: i32 = 1000;

/// Mapping between a table and a domain record.
///
/// `COLUMNS` must list the columns in the order `from_row` reads them.
pub trait Record: Sized {
    const TABLE: &'static str;
    const COLUMNS: &'static str;
    const ORDER_BY: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

impl Record for Student {
    const TABLE: &'static str = "student";
    const COLUMNS: &'static str = "student_id, first_name, last_name";
    const ORDER_BY: &'static str = "student_id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
        })
    }
}

impl Record for Teacher {
    const TABLE: &'static str = "teacher";
    const COLUMNS: &'static str = "teacher_id, first_name, last_name";
    const ORDER_BY: &'static str = "teacher_id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
        })
    }
}

impl Record for Course {
    const TABLE: &'static str = "course";
    const COLUMNS: &'static str =
        "course_id, department, course_number, section, title, teacher_id, semester, year";
    const ORDER_BY: &'static str = "course_id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            department: row.get(1)?,
            number: row.get(2)?,
            section: row.get(3)?,
            title: row.get(4)?,
            teacher_id: row.get(5)?,
            semester: row.get(6)?,
            year: row.get(7)?,
        })
    }
}

impl Record for Question {
    const TABLE: &'static str = "question";
    const COLUMNS: &'static str = "question_id, question, course_id, responses";
    const ORDER_BY: &'static str = "question_id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            course_id: row.get(2)?,
            responses: row.get(3)?,
        })
    }
}

impl Record for Answer {
    const TABLE: &'static str = "answer";
    const COLUMNS: &'static str = "answer_id, answer, question_id, selections";
    const ORDER_BY: &'static str = "answer_id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            question_id: row.get(2)?,
            selections: row.get(3)?,
        })
    }
}

impl Record for Enrolment {
    const TABLE: &'static str = "enrolment";
    const COLUMNS: &'static str = "enrolment_id, student_id, course_id";
    const ORDER_BY: &'static str = "enrolment_id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            student_id: row.get(1)?,
            course_id: row.get(2)?,
        })
    }
}

// ============================================================
// ERROR CLASSIFICATION
// ============================================================

/// True if the error is a UNIQUE constraint violation.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// True if the statement was interrupted by the deadline.
fn is_interrupted(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::OperationInterrupted
    )
}

/// Classify a raw SQLite error into a transport error.
fn classify(source: rusqlite::Error, context: &str) -> InfraError {
    if is_interrupted(&source) {
        InfraError::Timeout {
            context: context.to_string(),
        }
    } else {
        InfraError::database(context, source)
    }
}

/// Classify a raw SQLite error from an insert; unique violations become `on_unique`.
fn classify_insert(
    source: rusqlite::Error,
    context: &str,
    on_unique: impl FnOnce() -> DomainError,
) -> InfraError {
    if is_unique_violation(&source) {
        InfraError::Domain(on_unique())
    } else {
        classify(source, context)
    }
}

// ============================================================
// STATEMENT DEADLINE
// ============================================================

/// Per-operation deadline checked by the SQLite progress handler.
///
/// The deadline is stored as milliseconds since `epoch`; zero means unarmed.
#[derive(Debug)]
struct StatementDeadline {
    epoch: Instant,
    limit_ms: Arc<AtomicU64>,
    timeout: Option<Duration>,
}

impl StatementDeadline {
    fn new(timeout: Option<Duration>) -> Self {
        Self {
            epoch: Instant::now(),
            limit_ms: Arc::new(AtomicU64::new(0)),
            timeout,
        }
    }

    fn elapsed_ms(epoch: Instant) -> u64 {
        u64::try_from(epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn install(&self, conn: &Connection) {
        let epoch = self.epoch;
        let limit_ms = Arc::clone(&self.limit_ms);
        conn.progress_handler(
            PROGRESS_OPS,
            Some(move || {
                let limit = limit_ms.load(Ordering::Relaxed);
                limit != 0 && Self::elapsed_ms(epoch) >= limit
            }),
        );
    }

    /// Arm the deadline until the returned guard is dropped.
    fn arm(&self) -> DeadlineGuard<'_> {
        if let Some(timeout) = self.timeout {
            let budget = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            let limit = Self::elapsed_ms(self.epoch).saturating_add(budget).max(1);
            self.limit_ms.store(limit, Ordering::Relaxed);
        }
        DeadlineGuard { deadline: self }
    }
}

struct DeadlineGuard<'a> {
    deadline: &'a StatementDeadline,
}

impl Drop for DeadlineGuard<'_> {
    fn drop(&mut self) {
        self.deadline.limit_ms.store(0, Ordering::Relaxed);
    }
}

// ============================================================
// STORE
// ============================================================

/// Record store backed by a single SQLite connection.
///
/// Settings that failed to load are kept as their error message and reported
/// by the first statement, so commands without database access still run.
pub struct SqliteStore {
    settings: Result<DatabaseSettings, String>,
    conn: OnceCell<Connection>,
    deadline: StatementDeadline,
}

impl SqliteStore {
    /// Create a store for the configured database. Nothing is opened yet.
    pub fn new(settings: DatabaseSettings) -> Self {
        Self::with_settings(Ok(settings))
    }

    /// Create a store from the outcome of loading settings. Nothing is opened yet.
    pub fn with_settings(settings: Result<DatabaseSettings, String>) -> Self {
        let timeout = settings
            .as_ref()
            .ok()
            .and_then(DatabaseSettings::statement_timeout);
        Self {
            settings,
            conn: OnceCell::new(),
            deadline: StatementDeadline::new(timeout),
        }
    }

    /// Wrap an already open connection (e.g. in-memory databases).
    pub fn from_connection(conn: Connection, settings: DatabaseSettings) -> InfraResult<Self> {
        let store = Self::new(settings.clone());
        store
            .configure(&conn, &settings)
            .map_err(|e| InfraError::database("configure connection", e))?;
        // The cell was just created, so it is empty.
        let _ = store.conn.set(conn);
        Ok(store)
    }

    /// Path of the database file this store opens, if settings loaded.
    pub fn path(&self) -> Option<&Path> {
        self.settings.as_ref().ok().map(|settings| settings.path.as_path())
    }

    /// True once a statement has forced the connection open.
    pub fn is_connected(&self) -> bool {
        self.conn.get().is_some()
    }

    fn configure(&self, conn: &Connection, settings: &DatabaseSettings) -> rusqlite::Result<()> {
        conn.busy_timeout(settings.busy_timeout())?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.deadline.install(conn);
        Ok(())
    }

    fn open(&self) -> InfraResult<Connection> {
        let settings = self
            .settings
            .as_ref()
            .map_err(|message| InfraError::Settings(message.clone()))?;
        let path = &settings.path;
        debug!("open: path={}", path.display());
        // No CREATE flag, and never a URI: bundled SQLite parses names starting
        // with "file:" as URIs whose `mode=rwc` would create the file.
        let filename = if path.is_relative() {
            Path::new(".").join(path)
        } else {
            path.clone()
        };
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&filename, flags).map_err(|source| {
            InfraError::Connect {
                path: path.clone(),
                source,
            }
        })?;
        self.configure(&conn, settings).map_err(|source| InfraError::Connect {
            path: path.clone(),
            source,
        })?;
        Ok(conn)
    }

    fn connection(&self) -> InfraResult<&Connection> {
        self.conn.get_or_try_init(|| self.open())
    }

    /// All rows of a record's table in its natural order.
    #[instrument(level = "debug", skip(self), fields(table = T::TABLE))]
    pub fn select_all<T: Record>(&self) -> InfraResult<Vec<T>> {
        let conn = self.connection()?;
        let _deadline = self.deadline.arm();
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            T::COLUMNS,
            T::TABLE,
            T::ORDER_BY
        );
        let context = format!("select {}", T::TABLE);
        let mut stmt = conn.prepare(&sql).map_err(|e| classify(e, &context))?;
        let rows = stmt
            .query_map([], |row| T::from_row(row))
            .map_err(|e| classify(e, &context))?;
        rows.collect::<rusqlite::Result<Vec<T>>>()
            .map_err(|e| classify(e, &context))
    }

    /// Close the connection if one was opened.
    pub fn close(self) -> InfraResult<()> {
        if let Some(conn) = self.conn.into_inner() {
            debug!("close: path={:?}", self.settings.as_ref().map(|s| &s.path));
            conn.close()
                .map_err(|(_, source)| InfraError::database("close connection", source))?;
        }
        Ok(())
    }
}

fn row_exists(conn: &Connection, sql: &str, id: i64, context: &str) -> InfraResult<bool> {
    conn.query_row(sql, [id], |_| Ok(()))
        .optional()
        .map(|found| found.is_some())
        .map_err(|e| classify(e, context))
}

fn find_course(conn: &Connection, course_id: i64) -> InfraResult<Option<Course>> {
    let sql = format!(
        "SELECT {} FROM course WHERE course_id = ?1",
        Course::COLUMNS
    );
    conn.query_row(&sql, [course_id], |row| Course::from_row(row))
        .optional()
        .map_err(|e| classify(e, "select course"))
}

impl RecordStore for SqliteStore {
    #[instrument(level = "debug", skip(self))]
    fn insert_course(&self, course: &NewCourse) -> InfraResult<usize> {
        let conn = self.connection()?;
        let _deadline = self.deadline.arm();
        conn.execute(
            "INSERT INTO course (department, course_number, section) VALUES (?1, ?2, ?3)",
            params![course.department, course.number, course.section],
        )
        .map_err(|e| {
            classify_insert(e, "insert course", || DomainError::DuplicateCourse {
                department: course.department.clone(),
                number: course.number.clone(),
                section: course.section.clone(),
            })
        })
    }

    fn list_courses(&self) -> InfraResult<Vec<Course>> {
        self.select_all::<Course>()
    }

    #[instrument(level = "debug", skip(self))]
    fn insert_student(&self, student: &NewStudent) -> InfraResult<(usize, i64)> {
        let conn = self.connection()?;
        let _deadline = self.deadline.arm();
        let count = conn
            .execute(
                "INSERT INTO student (first_name, last_name) VALUES (?1, ?2)",
                params![student.first_name, student.last_name],
            )
            .map_err(|e| classify(e, "insert student"))?;
        Ok((count, conn.last_insert_rowid()))
    }

    fn list_students(&self) -> InfraResult<Vec<Student>> {
        self.select_all::<Student>()
    }

    #[instrument(level = "debug", skip(self))]
    fn enroll(&self, student_id: i64, course_id: i64) -> InfraResult<usize> {
        let conn = self.connection()?;
        let _deadline = self.deadline.arm();
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| classify(e, "begin enrolment"))?;

        if !row_exists(
            &tx,
            "SELECT 1 FROM student WHERE student_id = ?1",
            student_id,
            "select student",
        )? {
            return Err(DomainError::StudentNotFound(student_id).into());
        }
        if !row_exists(
            &tx,
            "SELECT 1 FROM course WHERE course_id = ?1",
            course_id,
            "select course",
        )? {
            return Err(DomainError::CourseNotFound(course_id).into());
        }

        let count = tx
            .execute(
                "INSERT INTO enrolment (student_id, course_id) VALUES (?1, ?2)",
                params![student_id, course_id],
            )
            .map_err(|e| {
                classify_insert(e, "insert enrolment", || DomainError::DuplicateEnrolment {
                    student_id,
                    course_id,
                })
            })?;
        tx.commit().map_err(|e| classify(e, "commit enrolment"))?;
        Ok(count)
    }

    #[instrument(level = "debug", skip(self))]
    fn drop_enrolment(&self, student_id: i64, course_id: i64) -> InfraResult<usize> {
        let conn = self.connection()?;
        let _deadline = self.deadline.arm();
        let count = conn
            .execute(
                "DELETE FROM enrolment WHERE student_id = ?1 AND course_id = ?2",
                params![student_id, course_id],
            )
            .map_err(|e| classify(e, "delete enrolment"))?;
        if count == 0 {
            return Err(DomainError::NotEnrolled {
                student_id,
                course_id,
            }
            .into());
        }
        Ok(count)
    }

    #[instrument(level = "debug", skip(self))]
    fn roster(&self, course_id: i64) -> InfraResult<(Course, Vec<Student>)> {
        let conn = self.connection()?;
        let _deadline = self.deadline.arm();
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| classify(e, "begin roster"))?;

        let course = find_course(&tx, course_id)?.ok_or(DomainError::CourseNotFound(course_id))?;

        let students = {
            let mut stmt = tx
                .prepare(
                    "SELECT s.student_id, s.first_name, s.last_name
                       FROM student s
                       JOIN enrolment e ON e.student_id = s.student_id
                      WHERE e.course_id = ?1
                      ORDER BY s.last_name, s.first_name, s.student_id",
                )
                .map_err(|e| classify(e, "select roster"))?;
            let rows = stmt
                .query_map([course_id], |row| Student::from_row(row))
                .map_err(|e| classify(e, "select roster"))?;
            rows.collect::<rusqlite::Result<Vec<Student>>>()
                .map_err(|e| classify(e, "select roster"))?
        };

        tx.commit().map_err(|e| classify(e, "commit roster"))?;
        Ok((course, students))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing::{memory_store, SCHEMA};

    fn constraint_error(extended_code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(extended_code), None)
    }

    #[test]
    fn given_unique_violation_when_classify_insert_then_maps_to_domain_error() {
        let err = classify_insert(
            constraint_error(ffi::SQLITE_CONSTRAINT_UNIQUE),
            "insert",
            || DomainError::StudentNotFound(1),
        );
        assert!(matches!(
            err,
            InfraError::Domain(DomainError::StudentNotFound(1))
        ));
    }

    #[test]
    fn given_other_constraint_when_classify_insert_then_stays_transport_error() {
        let err = classify_insert(
            constraint_error(ffi::SQLITE_CONSTRAINT_NOTNULL),
            "insert course",
            || DomainError::CourseNotFound(1),
        );
        assert!(matches!(err, InfraError::Database { .. }));
        assert!(err.to_string().starts_with("insert course: "));
    }

    #[test]
    fn given_interrupt_when_classify_then_reports_timeout() {
        let err = classify(constraint_error(ffi::SQLITE_INTERRUPT), "select student");
        assert!(matches!(err, InfraError::Timeout { .. }));
    }

    #[test]
    fn given_missing_file_when_first_statement_then_connect_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = DatabaseSettings {
            path: dir.path().join("absent.db"),
            ..DatabaseSettings::default()
        };
        let store = SqliteStore::new(settings);
        assert!(!store.is_connected());

        let err = store.list_students().unwrap_err();
        assert!(matches!(err, InfraError::Connect { .. }), "{err:?}");
        assert!(!dir.path().join("absent.db").exists());
    }

    #[test]
    fn given_existing_file_when_first_statement_then_connects_lazily() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("registrar.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch(SCHEMA)
            .unwrap();

        let store = SqliteStore::new(DatabaseSettings {
            path: path.clone(),
            ..DatabaseSettings::default()
        });
        assert!(!store.is_connected());
        assert!(store.list_courses().unwrap().is_empty());
        assert!(store.is_connected());
        store.close().unwrap();
    }

    #[test]
    fn given_long_statement_when_deadline_passes_then_interrupted() {
        let store = memory_store_with_timeout(Duration::from_millis(1));
        let conn = store.connection().unwrap();
        let _deadline = store.deadline.arm();
        std::thread::sleep(Duration::from_millis(5));

        let err = conn
            .query_row(
                "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 5000000)
                 SELECT count(*) FROM n",
                [],
                |row| row.get::<_, i64>(0),
            )
            .unwrap_err();
        assert!(is_interrupted(&err), "{err:?}");
    }

    #[test]
    fn given_disarmed_deadline_when_statement_runs_then_completes() {
        let store = memory_store_with_timeout(Duration::from_millis(1));
        let conn = store.connection().unwrap();
        {
            let _deadline = store.deadline.arm();
        }
        std::thread::sleep(Duration::from_millis(5));

        let count: i64 = conn
            .query_row(
                "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 10000)
                 SELECT count(*) FROM n",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 10000);
    }

    #[test]
    fn given_seeded_tables_when_select_all_then_maps_every_record() {
        let store = memory_store();
        let conn = store.connection().unwrap();
        conn.execute_batch(
            "INSERT INTO teacher (first_name, last_name) VALUES ('Grace', 'Hopper');
             INSERT INTO course (department, course_number, section, title, teacher_id, semester, year)
                  VALUES ('CS', '101', 'A', 'Intro', 1, 'Fall', 2024);
             INSERT INTO question (question, course_id, responses) VALUES ('Why?', 1, 3);
             INSERT INTO answer (answer, question_id, selections) VALUES ('Because', 1, 2);",
        )
        .unwrap();

        let teachers = store.select_all::<Teacher>().unwrap();
        assert_eq!(teachers[0].last_name, "Hopper");

        let courses = store.select_all::<Course>().unwrap();
        assert_eq!(courses[0].title.as_deref(), Some("Intro"));
        assert_eq!(courses[0].teacher_id, Some(1));
        assert_eq!(courses[0].year, Some(2024));

        let questions = store.select_all::<Question>().unwrap();
        assert_eq!(questions[0].responses, 3);

        let answers = store.select_all::<Answer>().unwrap();
        assert_eq!(answers[0].question_id, 1);
        assert_eq!(answers[0].selections, 2);
    }

    fn memory_store_with_timeout(timeout: Duration) -> SqliteStore {
        let settings = DatabaseSettings {
            statement_timeout_ms: u64::try_from(timeout.as_millis()).unwrap(),
            ..DatabaseSettings::default()
        };
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        SqliteStore::from_connection(conn, settings).unwrap()
    }
}
