use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const DDL: &str = r#"
CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    prefs hstore
);
CREATE TABLE items (
    id INTEGER PRIMARY KEY,
    owner_id INTEGER REFERENCES users(id),
    data hstore
);
CREATE TABLE plain (id INTEGER PRIMARY KEY);
"#;

fn hstore_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_hstore"))
}

fn write_schema(dir: &Path) -> PathBuf {
    let path = dir.join("schema.sql");
    fs::write(&path, DDL).expect("write schema");
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(hstore_bin())
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("run hstore")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).to_string()
}

#[test]
fn compile_where_pairs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_schema(dir.path());
    let out = run(&[
        "compile",
        "--schema",
        schema.to_str().unwrap(),
        "--model",
        "items",
        "--where",
        "data__size__gt=10",
        "--where",
        "data__color=red",
    ]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let text = stdout(&out);
    let first = text.lines().next().unwrap_or_default();
    assert_eq!(
        first,
        r#"SELECT "items".* FROM "items" WHERE CAST(NULLIF("items"."data"->'size','') AS integer) > %s AND "items"."data"->'color' = %s"#
    );
    assert!(text.contains("$1 = 10"), "stdout={text}");
    assert!(text.contains(r#"$2 = "red""#), "stdout={text}");
}

#[test]
fn compile_json_filter_with_negation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_schema(dir.path());
    let out = run(&[
        "compile",
        "--schema",
        schema.to_str().unwrap(),
        "--model",
        "items",
        "--filter",
        r#"{"or": [{"data__a": "1"}, {"owner__prefs__theme": "dark"}]}"#,
        "--negate",
        "--json",
    ]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json output");
    let sql = json["sql"].as_str().expect("sql");
    assert!(
        sql.contains(r#"LEFT OUTER JOIN "users" ON ("items"."owner_id" = "users"."id")"#),
        "sql={sql}"
    );
    assert!(
        sql.ends_with(r#"WHERE NOT ("items"."data"->'a' = %s OR "users"."prefs"->'theme' = %s)"#),
        "sql={sql}"
    );
    assert_eq!(
        json["params"],
        serde_json::json!([
            {"kind": "value", "value": "1"},
            {"kind": "value", "value": "dark"},
        ])
    );
}

#[test]
fn project_adds_an_extra_column() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_schema(dir.path());
    let out = run(&[
        "project",
        "--schema",
        schema.to_str().unwrap(),
        "--model",
        "items",
        "--field",
        "data",
        "--key",
        "color",
    ]);
    assert!(out.status.success());
    assert_eq!(
        stdout(&out).trim(),
        r#"SELECT "items".*, (data -> 'color') AS "color" FROM "items""#
    );
}

#[test]
fn columns_lists_hstore_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_schema(dir.path());
    let out = run(&["columns", "--schema", schema.to_str().unwrap()]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("items: data"), "stdout={text}");
    assert!(text.contains("users: prefs"), "stdout={text}");
    assert!(!text.contains("plain"), "stdout={text}");
}

#[test]
fn compile_errors_exit_non_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_schema(dir.path());
    let schema = schema.to_str().unwrap();

    let out = run(&[
        "compile", "--schema", schema, "--model", "items", "--where", "data__size__gt=true",
    ]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid value"));

    let out = run(&["compile", "--schema", schema, "--model", "ghosts"]);
    assert!(!out.status.success());

    let missing = dir.path().join("missing.sql");
    let out = run(&["columns", "--schema", missing.to_str().unwrap()]);
    assert!(!out.status.success());
}
