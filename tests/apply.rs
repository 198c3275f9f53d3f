//! Integration tests for the `apply` and `validate` actions
//!
//! The `apply` action merges YAML documents:
//! - Base document from stdin
//! - Overlay document(s) from file argument(s)
//! - Result to stdout
//!
//! The `validate` action checks stdin against a schema file.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use indoc::indoc;
use similar::TextDiff;
use tempfile::TempDir;

fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_yedit"))
}

/// Run yedit with given args and stdin, return (stdout, stderr, success)
fn run_yedit(args: &[&str], stdin_data: &str) -> (String, String, bool) {
    let mut child = Command::new(binary_path())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn yedit");

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(stdin_data.as_bytes())
            .expect("Failed to write to stdin");
    }

    let output = child.wait_with_output().expect("Failed to wait on child");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

fn assert_output_eq(actual: &str, expected: &str) {
    if actual != expected {
        let diff = TextDiff::from_lines(expected, actual);
        eprintln!();
        for line in diff
            .unified_diff()
            .header("expected", "actual")
            .to_string()
            .lines()
        {
            if line.starts_with('-') {
                eprintln!("\x1b[31m{}\x1b[0m", line);
            } else if line.starts_with('+') {
                eprintln!("\x1b[32m{}\x1b[0m", line);
            } else if line.starts_with('@') {
                eprintln!("\x1b[36m{}\x1b[0m", line);
            } else {
                eprintln!("{}", line);
            }
        }
        panic!("Output mismatch - see diff above");
    }
}

/// Create a temporary file with given content, return its path
fn temp_yaml_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write temp file");
    path
}

// =============================================================================
// apply
// =============================================================================

#[test]
fn test_apply_scalar_replacement_keeps_comment() {
    let tmp = TempDir::new().unwrap();
    let overlay = temp_yaml_file(&tmp, "overlay.yaml", "name: new-name\n");

    let (stdout, stderr, success) = run_yedit(
        &["apply", overlay.to_str().unwrap()],
        "name: test # Original name\ncount: 10\n",
    );
    assert!(success, "Command failed: {}", stderr);
    assert_output_eq(&stdout, "name: new-name # Original name\ncount: 10\n");
}

#[test]
fn test_apply_deep_mapping_merge() {
    let tmp = TempDir::new().unwrap();
    let overlay = temp_yaml_file(
        &tmp,
        "overlay.yaml",
        indoc! {"
            app:
              db:
                port: 5432
              debug: true
        "},
    );

    let base = indoc! {"
        # application
        app:
          name: demo   # keep
          db:
            host: localhost
    "};
    let (stdout, stderr, success) = run_yedit(&["apply", overlay.to_str().unwrap()], base);
    assert!(success, "Command failed: {}", stderr);
    assert_output_eq(
        &stdout,
        indoc! {"
            # application
            app:
              name: demo   # keep
              db:
                host: localhost
                port: 5432
              debug: true
        "},
    );
}

#[test]
fn test_apply_sequence_is_replaced() {
    let tmp = TempDir::new().unwrap();
    let overlay = temp_yaml_file(&tmp, "overlay.yaml", "ports: [443, 8443]\n");

    let (stdout, stderr, success) =
        run_yedit(&["apply", overlay.to_str().unwrap()], "ports: [80]  # exposed\n");
    assert!(success, "Command failed: {}", stderr);
    assert_output_eq(&stdout, "ports: [443, 8443]  # exposed\n");
}

#[test]
fn test_apply_multiple_overlays() {
    let tmp = TempDir::new().unwrap();
    let first = temp_yaml_file(&tmp, "first.yaml", "level: 1\nfrom_first: yes\n");
    let second = temp_yaml_file(&tmp, "second.yaml", "level: 2\n");

    let (stdout, stderr, success) = run_yedit(
        &[
            "apply",
            first.to_str().unwrap(),
            second.to_str().unwrap(),
        ],
        "level: 0\n",
    );
    assert!(success, "Command failed: {}", stderr);
    assert_output_eq(&stdout, "level: 2\nfrom_first: yes\n");
}

#[test]
fn test_apply_at_path() {
    let tmp = TempDir::new().unwrap();
    let overlay = temp_yaml_file(&tmp, "db.yaml", "host: db.internal\n");

    let (stdout, stderr, success) = run_yedit(
        &["apply", "--at", "services.db", overlay.to_str().unwrap()],
        "services:\n  web:\n    port: 80\n",
    );
    assert!(success, "Command failed: {}", stderr);
    assert_output_eq(
        &stdout,
        indoc! {"
            services:
              web:
                port: 80
              db:
                host: db.internal
        "},
    );
}

#[test]
fn test_apply_empty_overlay() {
    let tmp = TempDir::new().unwrap();
    let overlay = temp_yaml_file(&tmp, "empty.yaml", "");

    let base = "# kept\na: 1   # one\n";
    let (stdout, stderr, success) = run_yedit(&["apply", overlay.to_str().unwrap()], base);
    assert!(success, "Command failed: {}", stderr);
    assert_output_eq(&stdout, base);
}

#[test]
fn test_apply_keeps_trailing_comment() {
    let tmp = TempDir::new().unwrap();
    let overlay = temp_yaml_file(&tmp, "overlay.yaml", "b: 2\n");

    let (stdout, stderr, success) =
        run_yedit(&["apply", overlay.to_str().unwrap()], "a: 1\n# end\n");
    assert!(success, "Command failed: {}", stderr);
    assert_output_eq(&stdout, "a: 1\nb: 2\n# end\n");
}

#[test]
fn test_apply_scalar_over_mapping_keeps_comments_below_it() {
    let tmp = TempDir::new().unwrap();
    let overlay = temp_yaml_file(&tmp, "overlay.yaml", "a: 5\n");

    let base = indoc! {"
        a:
          b: 1
          # note about a
        c: 2
    "};
    let (stdout, stderr, success) = run_yedit(&["apply", overlay.to_str().unwrap()], base);
    assert!(success, "Command failed: {}", stderr);
    assert_output_eq(
        &stdout,
        indoc! {"
            a: 5
              # note about a
            c: 2
        "},
    );
}

#[test]
fn test_apply_missing_overlay_file() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("missing.yaml");

    let (stdout, stderr, success) = run_yedit(&["apply", missing.to_str().unwrap()], "a: 1\n");
    assert!(!success);
    assert_output_eq(&stdout, "");
    assert!(stderr.contains("Failed to read"), "stderr: {}", stderr);
}

#[test]
fn test_apply_no_overlay_argument() {
    let (_, _, success) = run_yedit(&["apply"], "a: 1\n");
    assert!(!success);
}

// =============================================================================
// validate
// =============================================================================

const SCHEMA: &str = indoc! {"
    type: map
    required: [name, port]
    properties:
      name:
        type: string
        pattern: '^[a-z]+$'
      port:
        type: int
        minimum: 1
        maximum: 65535
"};

#[test]
fn test_validate_success() {
    let tmp = TempDir::new().unwrap();
    let schema = temp_yaml_file(&tmp, "schema.yaml", SCHEMA);

    let (stdout, stderr, success) = run_yedit(
        &["validate", schema.to_str().unwrap()],
        "name: api\nport: 8080\n",
    );
    assert!(success, "Command failed: {}", stderr);
    assert_output_eq(&stdout, "");
}

#[test]
fn test_validate_missing_field() {
    let tmp = TempDir::new().unwrap();
    let schema = temp_yaml_file(&tmp, "schema.yaml", SCHEMA);

    let (stdout, stderr, success) =
        run_yedit(&["validate", schema.to_str().unwrap()], "name: api\n");
    assert!(!success);
    assert_output_eq(&stdout, "");
    assert!(
        stderr.contains("required field 'port' missing at root"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn test_validate_constraint_path() {
    let tmp = TempDir::new().unwrap();
    let schema = temp_yaml_file(&tmp, "schema.yaml", SCHEMA);

    let (_, stderr, success) = run_yedit(
        &["validate", schema.to_str().unwrap()],
        "name: Api\nport: 8080\n",
    );
    assert!(!success);
    assert!(stderr.contains("at 'name'"), "stderr: {}", stderr);
}

#[test]
fn test_validate_bad_schema() {
    let tmp = TempDir::new().unwrap();
    let schema = temp_yaml_file(&tmp, "schema.yaml", "type: map\nshape: round\n");

    let (_, stderr, success) = run_yedit(&["validate", schema.to_str().unwrap()], "a: 1\n");
    assert!(!success);
    assert!(stderr.contains("invalid schema"), "stderr: {}", stderr);
}
