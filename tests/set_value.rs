//! Integration tests for the `set-value` and `del` actions

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

// =============================================================================
// set-value
// =============================================================================

#[test]
fn test_set_value_simple() {
    let (stdout, stderr, success) = run_yedit(&["set-value", "name", "new"], "name: old\n");
    assert!(success, "stderr: {}", stderr);
    assert_output_eq(&stdout, "name: new\n");
}

#[test]
fn test_set_value_into_flow_mapping() {
    let (stdout, stderr, success) =
        run_yedit(&["set-value", "config.host", "localhost"], "config: {}\n");
    assert!(success, "stderr: {}", stderr);
    assert_output_eq(&stdout, "config: {host: localhost}\n");
}

#[test]
fn test_set_value_creates_missing_parents() {
    let (stdout, stderr, success) = run_yedit(
        &["set-value", "server.tls.enabled", "on"],
        "# settings\nname: web\n",
    );
    assert!(success, "stderr: {}", stderr);
    assert_output_eq(
        &stdout,
        indoc! {"
            # settings
            name: web
            server:
              tls:
                enabled: on
        "},
    );
}

#[test]
fn test_set_value_keeps_comments_and_spacing() {
    let input = indoc! {"
        # Database settings
        db:
            host:   localhost   # primary host

            port: 5432
    "};
    let (stdout, stderr, success) = run_yedit(&["set-value", "db.host", "db.internal"], input);
    assert!(success, "stderr: {}", stderr);
    assert_output_eq(
        &stdout,
        indoc! {"
            # Database settings
            db:
                host:   db.internal   # primary host

                port: 5432
        "},
    );
}

#[test]
fn test_set_value_literal_string_is_quoted() {
    let (stdout, stderr, success) = run_yedit(&["set-value", "flag", "true"], "flag: false\n");
    assert!(success, "stderr: {}", stderr);
    assert_output_eq(&stdout, "flag: \"true\"\n");
}

#[test]
fn test_set_value_yaml_mode() {
    let (stdout, stderr, success) =
        run_yedit(&["set-value", "-y", "ports", "[80, 443]"], "name: web\n");
    assert!(success, "stderr: {}", stderr);
    assert_output_eq(&stdout, "name: web\nports: [80, 443]\n");

    let (stdout, stderr, success) = run_yedit(&["-y", "set-value", "debug", "true"], "debug: no\n");
    assert!(success, "stderr: {}", stderr);
    assert_output_eq(&stdout, "debug: true\n");
}

#[test]
fn test_set_value_on_empty_input() {
    let (stdout, stderr, success) = run_yedit(&["set-value", "a.b", "c"], "");
    assert!(success, "stderr: {}", stderr);
    assert_output_eq(&stdout, "a:\n  b: c\n");
}

#[test]
fn test_set_value_sequence_item() {
    let (stdout, stderr, success) =
        run_yedit(&["set-value", "hosts[1]", "c"], "hosts:\n  - a\n  - b\n");
    assert!(success, "stderr: {}", stderr);
    assert_output_eq(&stdout, "hosts:\n  - a\n  - c\n");
}

#[test]
fn test_set_value_through_scalar_fails() {
    let (stdout, stderr, success) = run_yedit(&["set-value", "list.key", "x"], "list: [1]\n");
    assert!(!success);
    assert_output_eq(&stdout, "");
    assert!(stderr.contains("non-struct"), "stderr: {}", stderr);
}

#[test]
fn test_set_value_in_place() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("config.yaml");
    fs::write(&file, "name: old  # current\n").unwrap();

    let (stdout, stderr, success) = run_yedit(
        &["-f", file.to_str().unwrap(), "-i", "set-value", "name", "new"],
        "",
    );
    assert!(success, "stderr: {}", stderr);
    assert_output_eq(&stdout, "");
    assert_output_eq(&fs::read_to_string(&file).unwrap(), "name: new  # current\n");
}

#[test]
fn test_in_place_requires_file() {
    let (_, stderr, success) = run_yedit(&["-i", "set-value", "a", "b"], "a: 1\n");
    assert!(!success);
    assert!(stderr.contains("--in-place requires --file"), "stderr: {}", stderr);
}

#[test]
fn test_set_value_keeps_crlf() {
    let (stdout, stderr, success) =
        run_yedit(&["set-value", "b", "3"], "a: 1\r\nb: 2\r\n");
    assert!(success, "stderr: {}", stderr);
    assert_output_eq(&stdout, "a: 1\r\nb: \"3\"\r\n");
}

// =============================================================================
// del
// =============================================================================

#[test]
fn test_del_key() {
    let input = indoc! {"
        a:
          b: 1   # gone
          c: 2   # stays
        d: 3
    "};
    let (stdout, stderr, success) = run_yedit(&["del", "a.b"], input);
    assert!(success, "stderr: {}", stderr);
    assert_output_eq(
        &stdout,
        indoc! {"
            a:
              c: 2   # stays
            d: 3
        "},
    );
}

#[test]
fn test_del_sequence_item() {
    let (stdout, stderr, success) = run_yedit(&["del", "l[0]"], "l:\n  - x\n  - y\n");
    assert!(success, "stderr: {}", stderr);
    assert_output_eq(&stdout, "l:\n  - y\n");
}

#[test]
fn test_del_missing_key() {
    let (stdout, stderr, success) = run_yedit(&["del", "nope"], "a: 1\n");
    assert!(!success);
    assert_output_eq(&stdout, "");
    assert!(stderr.contains("missing key 'nope'"), "stderr: {}", stderr);
}

#[test]
fn test_del_missing_key_quiet() {
    let (stdout, stderr, success) = run_yedit(&["-q", "del", "nope"], "a: 1\n");
    assert!(!success);
    assert_output_eq(&stdout, "");
    assert_output_eq(&stderr, "");
}
