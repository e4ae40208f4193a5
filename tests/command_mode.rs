//! Integration tests for command mode (-c/--command flag)

use std::path::PathBuf;
use std::process::Command;

fn temp_path(name: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "tally_cmd_{}_{}_{:?}.{}",
        name,
        std::process::id(),
        std::thread::current().id(),
        ext
    ))
}

struct Cleanup(Vec<PathBuf>);
impl Drop for Cleanup {
    fn drop(&mut self) {
        for path in &self.0 {
            let _ = std::fs::remove_file(path);
        }
    }
}

fn run_command(args: &[&str]) -> (String, String, i32) {
    // Tests must be deterministic and not depend on a user's config.toml.
    let config = temp_path("config", "toml");
    let _cleanup = Cleanup(vec![config.clone()]);
    std::fs::write(&config, "").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_tally"))
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&config)
        .args(args)
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

#[test]
fn test_basic_arithmetic() {
    let (stdout, _, code) = run_command(&["-c", "5 + 3"]);
    assert_eq!(stdout.trim(), "8");
    assert_eq!(code, 0);
}

#[test]
fn test_precedence() {
    let (stdout, _, code) = run_command(&["-c", "1 + 2 * 2", "-c", "1 * (2 + 2)", "-c", "3 ^ 3"]);
    assert_eq!(stdout.trim(), "5\n4\n27");
    assert_eq!(code, 0);
}

#[test]
fn test_aggregates() {
    let (stdout, _, code) = run_command(&[
        "-c",
        "SUM(1,2,3)",
        "-c",
        "AVERAGE(10,20,30)",
        "-c",
        "MIN(1,2,3)",
        "-c",
        "RANGE(4, 9, 1)",
    ]);
    assert_eq!(stdout.trim(), "6\n20\n1\n8");
    assert_eq!(code, 0);
}

#[test]
fn test_auto_prepend_equals() {
    let (stdout1, _, _) = run_command(&["-c", "10 + 5"]);
    let (stdout2, _, _) = run_command(&["-c", "=10 + 5"]);
    assert_eq!(stdout1, stdout2);
}

#[test]
fn test_error_exit_code() {
    let (stdout, _, code) = run_command(&["-c", "UNKNOWN(1)"]);
    assert_eq!(stdout.trim(), "#TOKEN!");
    assert_eq!(code, 1);
}

#[test]
fn test_division_by_zero() {
    let (stdout, _, code) = run_command(&["-c", "1/0"]);
    assert_eq!(stdout.trim(), "#INF!");
    assert_eq!(code, 0);
}

#[test]
fn test_string_concatenation() {
    let (stdout, _, code) = run_command(&["-c", r#""tal" + "ly""#]);
    assert_eq!(stdout.trim(), "tally");
    assert_eq!(code, 0);
}

#[test]
fn test_commands_read_loaded_file() {
    let grd = temp_path("sheet", "grd");
    let _cleanup = Cleanup(vec![grd.clone()]);
    std::fs::write(
        &grd,
        "# Tally Spreadsheet\n@rows: 5\n@cols: 2\nA1: \"10\"\nA2: \"20\"\nA3: \"30\"\n",
    )
    .unwrap();

    let (stdout, _, code) = run_command(&[grd.to_str().unwrap(), "-c", "SUM(A1..A3)", "-c", "A2 / 4"]);
    assert_eq!(stdout.trim(), "60\n5");
    assert_eq!(code, 0);
}

#[test]
fn test_listing_without_commands() {
    let json = temp_path("sheet", "json");
    let _cleanup = Cleanup(vec![json.clone()]);
    std::fs::write(&json, r#"{"rows": 3, "cols": 3, "B2": "A1 + 2", "A1": "1"}"#).unwrap();

    let (stdout, _, code) = run_command(&[json.to_str().unwrap()]);
    assert_eq!(stdout, "A1\t1\nB2\t3\n");
    assert_eq!(code, 0);
}

#[test]
fn test_csv_export() {
    let json = temp_path("export", "json");
    let csv = temp_path("export", "csv");
    let _cleanup = Cleanup(vec![json.clone(), csv.clone()]);
    std::fs::write(&json, r#"{"rows": 2, "cols": 2, "A1": "2", "B2": "A1 * 3"}"#).unwrap();

    let (_, _, code) = run_command(&[json.to_str().unwrap(), "-o", csv.to_str().unwrap()]);
    assert_eq!(code, 0);
    assert_eq!(std::fs::read_to_string(&csv).unwrap(), "2,\n,6\n");
}

#[test]
fn test_bad_file_fails() {
    let grd = temp_path("bad", "grd");
    let _cleanup = Cleanup(vec![grd.clone()]);
    std::fs::write(&grd, "not a cell line\n").unwrap();

    let (_, stderr, code) = run_command(&[grd.to_str().unwrap()]);
    assert!(stderr.contains("line 1"));
    assert_eq!(code, 1);
}

#[test]
fn test_unknown_option() {
    let (_, stderr, code) = run_command(&["--frobnicate"]);
    assert!(stderr.contains("Unknown option"));
    assert_eq!(code, 1);
}

#[test]
fn test_help_lists_functions() {
    let (_, stderr, code) = run_command(&["--help"]);
    assert!(stderr.contains("Functions:"));
    assert!(stderr.contains("SUM"));
    assert!(stderr.contains("Sum of numeric arguments"));
    assert!(stderr.contains("Alias of AVERAGE"));
    assert_eq!(code, 0);
}

#[test]
fn test_verbose_logs_load() {
    let grd = temp_path("verbose", "grd");
    let _cleanup = Cleanup(vec![grd.clone()]);
    std::fs::write(&grd, "@rows: 2\n@cols: 2\nA1: \"1\"\n").unwrap();

    let (stdout, stderr, code) = run_command(&["-v", grd.to_str().unwrap()]);
    assert_eq!(stdout, "A1\t1\n");
    assert!(stderr.contains("loaded sheet"));
    assert_eq!(code, 0);
}
