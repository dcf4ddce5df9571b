//! Runs the registrar binary and checks exit status and the error stream.

use std::path::Path;
use std::process::{Command, Output};

use rstest::rstest;
use tempfile::TempDir;

use registrar::util::testing::create_database;

const HINT: &str = "run 'registrar help' for help";

/// Run the binary with an isolated config home and no REGISTRAR_* overrides.
fn registrar(config_home: &Path, args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_registrar"));
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("RUST_LOG")
        .env_remove("REGISTRAR_DATABASE__PATH")
        .env_remove("REGISTRAR_DATABASE__BUSY_TIMEOUT_MS")
        .env_remove("REGISTRAR_DATABASE__STATEMENT_TIMEOUT_MS")
        .arg("--no-color")
        .args(args);
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd.output().expect("run registrar binary")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[rstest]
#[case(&[], "error: required command missing")]
#[case(&["frobnicate"], "error: unknown command (frobnicate)")]
#[case(&["createCourse", "CS", "101"], "error: createCourse: ")]
#[case(&["courseRoster", "abc"], "error: invalid course id")]
fn given_usage_error_when_run_then_exit_1_with_hint(#[case] args: &[&str], #[case] message: &str) {
    let home = TempDir::new().unwrap();
    let output = registrar(home.path(), args, &[]);

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains(message), "{err}");
    assert!(err.contains(HINT), "{err}");
    assert!(stdout(&output).is_empty());
}

#[test]
fn given_missing_database_when_listing_then_exit_1_with_connection_error() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("absent.db");
    let output = registrar(
        home.path(),
        &["--database", db.to_str().unwrap(), "listStudents"],
        &[],
    );

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("error: cannot connect to database"), "{err}");
    assert!(err.contains(HINT), "{err}");
    assert!(!db.exists());
}

#[test]
fn given_option_without_value_when_run_then_exit_1_not_2() {
    let home = TempDir::new().unwrap();
    let output = registrar(home.path(), &["--database"], &[]);

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("--database"), "{err}");
    assert!(err.contains(HINT), "{err}");
}

#[test]
fn given_long_help_flag_when_run_then_exit_0() {
    let home = TempDir::new().unwrap();
    let output = registrar(home.path(), &["--help"], &[]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("--database"));
}

#[rstest]
#[case(&[("REGISTRAR_DATABASE__BUSY_TIMEOUT_MS", "soon")], &[])]
#[case(&[], &["--config", "/nonexistent/registrar.toml"])]
fn given_broken_config_when_help_then_exit_0(
    #[case] env: &[(&str, &str)],
    #[case] options: &[&str],
) {
    let home = TempDir::new().unwrap();
    let args: Vec<&str> = options.iter().copied().chain(["help"]).collect();
    let output = registrar(home.path(), &args, env);

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(stdout(&output).starts_with("usage: registrar command [args...]"));
    assert!(stderr(&output).is_empty());
}

#[test]
fn given_broken_config_when_listing_then_exit_1_with_config_error() {
    let home = TempDir::new().unwrap();
    let output = registrar(
        home.path(),
        &["listStudents"],
        &[("REGISTRAR_DATABASE__BUSY_TIMEOUT_MS", "soon")],
    );

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("error: config error:"), "{err}");
    assert!(err.contains(HINT), "{err}");
}

#[test]
fn given_database_when_creating_and_listing_then_exit_0() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("registrar.db");
    create_database(&db).unwrap();
    let db = db.to_str().unwrap();

    let created = registrar(home.path(), &["--database", db, "createStudent", "Ada", "Lovelace"], &[]);
    assert_eq!(created.status.code(), Some(0), "{}", stderr(&created));
    assert!(stdout(&created).starts_with("1 student(s) created (id "));

    let listed = registrar(home.path(), &["--database", db, "listStudents"], &[]);
    assert_eq!(listed.status.code(), Some(0));
    assert!(stdout(&listed).contains("Lovelace, Ada"));
}
