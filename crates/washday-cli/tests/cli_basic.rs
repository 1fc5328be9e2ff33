//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_washday"))
        .args(args)
        .env("WASHDAY_DATA_DIR", data_dir.path())
        .env_remove("WASHDAY_LOG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &TempDir, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_timer_status_starts_idle() {
    let dir = TempDir::new().unwrap();
    let status = run_json(&dir, &["timer", "status", "wash"]);
    assert_eq!(status["phase"], "idle");
    assert_eq!(status["is_running"], false);
    assert_eq!(status["remaining_seconds"], 0);
    assert_eq!(status["total_seconds"], 3600);
    assert_eq!(status["can_reset"], false);
}

#[test]
fn test_timer_start_stop_reset() {
    let dir = TempDir::new().unwrap();
    let started = run_json(&dir, &["timer", "start", "dry", "--minutes", "45"]);
    assert_eq!(started["type"], "timer_started");
    assert_eq!(started["duration_secs"], 2700);

    let status = run_json(&dir, &["timer", "status", "dry"]);
    assert_eq!(status["phase"], "running");

    let alerts = run_json(&dir, &["alerts"]);
    assert_eq!(alerts.as_array().unwrap().len(), 1);
    assert_eq!(alerts[0]["cycle_type"], "dry");

    let stopped = run_json(&dir, &["timer", "stop", "dry"]);
    assert_eq!(stopped["type"], "timer_stopped");
    assert!(run_json(&dir, &["alerts"]).as_array().unwrap().is_empty());

    let reset = run_json(&dir, &["timer", "reset", "dry"]);
    assert_eq!(reset["type"], "timer_reset");
    assert!(run_json(&dir, &["history"]).as_array().unwrap().is_empty());
}

#[test]
fn test_timer_start_rejects_non_positive_duration() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["timer", "start", "wash", "--seconds", "0"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Duration must be positive"));
}

#[test]
fn test_timer_start_with_program() {
    let dir = TempDir::new().unwrap();
    let started = run_json(&dir, &["timer", "start", "wash", "--program", "delicate"]);
    assert_eq!(started["duration_secs"], 2700);

    let (_, _, code) = run_cli(&dir, &["timer", "start", "wash", "--program", "spin"]);
    assert_ne!(code, 0);
}

#[test]
fn test_item_lifecycle() {
    let dir = TempDir::new().unwrap();
    let item = run_json(
        &dir,
        &["item", "add", "Blue Jeans", "--category", "bottoms", "--color", "blue"],
    );
    let id = item["id"].as_str().unwrap().to_string();
    assert_eq!(item["wash_count"], 0);

    let washed = run_json(&dir, &["item", "wash", &id]);
    assert_eq!(washed["wash_count"], 1);
    assert_eq!(washed["days_since_wash"], 0);

    let list = run_json(&dir, &["item", "list", "--search", "jeans"]);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (_, _, code) = run_cli(&dir, &["item", "delete", &id]);
    assert_eq!(code, 0);
    assert!(run_json(&dir, &["item", "list"]).as_array().unwrap().is_empty());
}

#[test]
fn test_item_add_rejects_blank_name() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&dir, &["item", "add", "   "]);
    assert_ne!(code, 0);
}

#[test]
fn test_supply_use_clamps_and_reports_low() {
    let dir = TempDir::new().unwrap();
    let supply = run_json(&dir, &["supply", "add", "Tide", "--type", "pods"]);
    let id = supply["id"].as_str().unwrap().to_string();

    let used = run_json(&dir, &["supply", "use", &id, "250"]);
    assert_eq!(used["remaining_percent"], 0.0);
    assert_eq!(used["is_low"], true);

    let (_, _, code) = run_cli(&dir, &["supply", "use", &id, "-5"]);
    assert_ne!(code, 0);

    let low = run_json(&dir, &["supply", "low"]);
    assert_eq!(low.as_array().unwrap().len(), 1);
}

#[test]
fn test_stats_on_empty_data() {
    let dir = TempDir::new().unwrap();
    let stats = run_json(&dir, &["stats"]);
    assert_eq!(stats["total_washes"], 0);
    assert_eq!(stats["average_washes_per_week"], 0.0);
    assert!(stats["most_washed_category"].is_null());
}

#[test]
fn test_config_get_set() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["config", "get", "timers.wash_default_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "3600");

    let (_, _, code) = run_cli(&dir, &["config", "set", "timers.wash_default_secs", "1800"]);
    assert_eq!(code, 0);
    let status = run_json(&dir, &["timer", "status", "wash"]);
    assert_eq!(status["total_seconds"], 1800);

    let (_, _, code) = run_cli(&dir, &["config", "set", "timers.spin", "1"]);
    assert_ne!(code, 0);
}

#[test]
fn test_reset_requires_confirmation() {
    let dir = TempDir::new().unwrap();
    run_json(&dir, &["item", "add", "Towel", "--category", "towels"]);

    let (_, _, code) = run_cli(&dir, &["reset"]);
    assert_ne!(code, 0);
    assert_eq!(run_json(&dir, &["item", "list"]).as_array().unwrap().len(), 1);

    let (_, _, code) = run_cli(&dir, &["reset", "--yes"]);
    assert_eq!(code, 0);
    assert!(run_json(&dir, &["item", "list"]).as_array().unwrap().is_empty());
}
