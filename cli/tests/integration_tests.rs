use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use serde_json::{Value, json};

const BIN: &str = env!("CARGO_BIN_EXE_protean");

fn run(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run protean")
}

fn run_with_stdin(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(BIN)
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn protean");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().expect("failed to wait for protean")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "protean failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn db_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn insert_then_get_and_find() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("app.db");

    let inserted = stdout_json(&run(&[
        "insert",
        "--db",
        db_arg(&db),
        "--table",
        "people",
        "--json",
        r#"{"name": "Ana", "age": 30}"#,
    ]));
    assert_eq!(inserted, json!({"id": 1, "name": "Ana", "age": 30}));

    let fetched = stdout_json(&run(&["get", "--db", db_arg(&db), "--table", "people", "--id", "1"]));
    assert_eq!(fetched, inserted);

    let missing = stdout_json(&run(&["get", "--db", db_arg(&db), "--table", "people", "--id", "abc"]));
    assert_eq!(missing, Value::Null);

    let found = stdout_json(&run(&[
        "find",
        "--db",
        db_arg(&db),
        "--table",
        "people",
        "--where",
        r#"{"name": "Ana", "unknownKey": 5}"#,
    ]));
    assert_eq!(found, json!([inserted]));
}

#[test]
fn insert_reads_stdin_and_update_changes_row() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("app.db");

    let inserted = stdout_json(&run_with_stdin(
        &["insert", "--db", db_arg(&db), "--table", "people"],
        r#"{"name": "Ana", "age": 30}"#,
    ));
    assert_eq!(inserted["id"], json!(1));

    let updated = stdout_json(&run(&[
        "update",
        "--db",
        db_arg(&db),
        "--table",
        "people",
        "--id",
        "1",
        "--json",
        r#"{"age": 31, "tags": ["a"]}"#,
    ]));
    assert_eq!(updated, json!({"id": 1, "name": "Ana", "age": 31, "tags": ["a"]}));

    let none = stdout_json(&run(&[
        "update", "--db", db_arg(&db), "--table", "people", "--id", "9", "--json", "{}",
    ]));
    assert_eq!(none, Value::Null);
}

#[test]
fn schema_reports_fields() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("app.db");

    let empty = stdout_json(&run(&["schema", "--db", db_arg(&db), "--table", "people"]));
    assert_eq!(empty, json!({}));

    run(&[
        "insert",
        "--db",
        db_arg(&db),
        "--table",
        "people",
        "--json",
        r#"{"name": "Ana", "admin": true}"#,
    ]);
    let fields = stdout_json(&run(&["schema", "--db", db_arg(&db), "--table", "people"]));
    assert_eq!(
        fields,
        json!({
            "id": {"kind": "id", "not_null": false},
            "name": {"kind": "string", "not_null": false},
            "admin": {"kind": "boolean", "not_null": false}
        })
    );
}

#[test]
fn declare_creates_table_from_schema_file() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("app.db");
    let schema = dir.path().join("posts.json");
    let config = dir.path().join("posts.yaml");
    fs::write(
        &schema,
        r#"{"properties": {"title": {"type": "string"}, "votes": {"type": "integer", "default": 0}}}"#,
    )
    .unwrap();
    fs::write(&config, "declared_not_null: true\n").unwrap();

    let fields = stdout_json(&run(&[
        "declare",
        "--db",
        db_arg(&db),
        "--table",
        "posts",
        "--config",
        config.to_str().unwrap(),
        "--schema",
        schema.to_str().unwrap(),
    ]));
    assert_eq!(
        fields,
        json!({
            "title": {"kind": "string", "not_null": true},
            "votes": {"kind": "number", "not_null": true, "default": 0},
            "id": {"kind": "id", "not_null": false}
        })
    );

    let failed = run(&[
        "insert", "--db", db_arg(&db), "--table", "posts", "--json", r#"{"votes": 1}"#,
    ]);
    assert!(!failed.status.success());
    assert!(String::from_utf8_lossy(&failed.stderr).contains("error:"));
}

#[test]
fn unsupported_schema_type_fails() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("app.db");
    let schema = dir.path().join("bad.json");
    fs::write(&schema, r#"{"properties": {"n": {"type": "bigint"}}}"#).unwrap();

    let output = run(&[
        "declare",
        "--db",
        db_arg(&db),
        "--table",
        "bad",
        "--schema",
        schema.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("type not supported: bigint"), "stderr: {stderr}");
}

#[test]
fn invalid_input_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("app.db");

    let not_json = run(&["insert", "--db", db_arg(&db), "--table", "t", "--json", "{oops"]);
    assert_eq!(not_json.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&not_json.stderr).contains("Invalid JSON"));

    let not_object = run(&["insert", "--db", db_arg(&db), "--table", "t", "--json", "[1, 2]"]);
    assert_eq!(not_object.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&not_object.stderr).contains("Expected a JSON object"));

    let empty_table = run(&["find", "--db", db_arg(&db), "--table", ""]);
    assert_eq!(empty_table.status.code(), Some(1));
}

#[test]
fn find_on_fresh_database_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("fresh.db");

    let rows = stdout_json(&run(&["find", "--db", db_arg(&db), "--table", "nothing"]));
    assert_eq!(rows, json!([]));
}
