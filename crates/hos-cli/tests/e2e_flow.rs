//! End-to-end tests for a full log day.
//!
//! Tests the full pipeline: trip → status → changes → finalize → logs/export
//! against the real binary with an isolated home directory.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn hos_binary() -> String {
    env!("CARGO_BIN_EXE_hos").to_string()
}

/// Runs `hos` with its config and data confined to `temp`.
fn hos(temp: &Path, args: &[&str]) -> Output {
    Command::new(hos_binary())
        .env("HOME", temp)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env_remove("HOS_API_BASE_URL")
        .env_remove("HOS_API_TOKEN")
        .env("HOS_DATABASE_PATH", temp.join("data").join("hos.db"))
        .env("HOS_TIMEZONE", "utc")
        .args(args)
        .output()
        .expect("failed to run hos")
}

/// Runs `hos` and returns stdout, failing the test on a non-zero exit.
fn hos_ok(temp: &Path, args: &[&str]) -> String {
    let output = hos(temp, args);
    assert!(
        output.status.success(),
        "hos {} should succeed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

fn change(temp: &Path, status: &str, at: &str, location: Option<&str>) {
    let mut args = vec!["change", status, "--at", at];
    if let Some(location) = location {
        args.extend(["--location", location]);
    }
    hos_ok(temp, &args);
}

#[test]
fn test_full_day_flow() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();

    hos_ok(home, &["trip", "--driver", "Ada Park", "--pickup", "Tulsa, OK"]);

    let status = hos_ok(home, &["status", "--at", "2025-01-15T00:00:00Z"]);
    assert!(status.starts_with("Log day 2025-01-15 (open)"));

    change(home, "on", "2025-01-15T06:00:00Z", Some("Dallas, TX"));
    change(home, "driving", "2025-01-15T07:00:00Z", None);
    change(home, "on", "2025-01-15T08:00:00Z", None);
    change(home, "driving", "2025-01-15T12:00:00Z", None);
    change(home, "on", "2025-01-15T13:00:00Z", Some("Denton, TX"));

    let finalized = hos_ok(home, &["finalize", "--at", "2025-01-15T18:00:00Z"]);
    assert!(finalized.contains(
        "Summary: off 6.00 | sleeper 0.00 | driving 2.00 | on 10.00 | total 18.00"
    ));
    assert!(finalized.contains("Total miles: 110.0"));
    assert!(finalized.contains("Remarks: Dallas, TX → Denton, TX → Tulsa, OK"));
    assert!(finalized.contains("Started log day 2025-01-16"));

    let logs = hos_ok(home, &["logs"]);
    assert!(logs.starts_with("2025-01-15"));
    assert!(logs.contains("pending"));

    let export = hos_ok(home, &["export", "--date", "2025-01-15"]);
    let records: serde_json::Value = serde_json::from_str(&export).unwrap();
    let record = &records[0];
    assert_eq!(record["date"], "2025-01-15");
    assert_eq!(record["totalMiles"], 110.0);
    assert_eq!(record["segments"].as_array().unwrap().len(), 6);
    assert_eq!(record["summary"]["onDuty"], 10.0);
    assert_eq!(record["tripData"]["driverName"], "Ada Park");

    let grid = hos_ok(home, &["grid", "--date", "2025-01-15"]);
    assert!(grid.contains("Driving        .......#....#..........."));

    let status: serde_json::Value =
        serde_json::from_str(&hos_ok(home, &["status", "--json"])).unwrap();
    assert_eq!(status["date"], "2025-01-16");
    assert_eq!(status["currentStatus"], 0);

    assert!(home.join("data").join("hos.db").exists());
}

#[test]
fn test_rejected_change_exits_with_error() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();

    change(home, "driving", "2025-01-15T09:00:00Z", None);

    let output = hos(home, &["change", "on", "--at", "2025-01-15T08:00:00Z"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("clock regression"), "stderr: {stderr}");

    let output = hos(home, &["change", "napping"]);
    assert!(!output.status.success());
}

#[test]
fn test_change_past_midnight_rolls_over() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();

    change(home, "driving", "2025-01-15T22:00:00Z", None);
    let output = hos_ok(home, &["change", "off", "--at", "2025-01-16T02:00:00Z"]);
    assert!(output.contains(
        "Closed log for 2025-01-15 at midnight (2.00 driving hours, 110.0 miles)"
    ));

    let export: serde_json::Value = serde_json::from_str(&hos_ok(home, &["export"])).unwrap();
    assert_eq!(export[0]["segments"][1]["end"], 24.0);
    assert_eq!(export[0]["finalizedAt"], "2025-01-16T00:00:00Z");
}

#[test]
fn test_no_subcommand_prints_help() {
    let temp = TempDir::new().unwrap();
    let output = hos_ok(temp.path(), &[]);
    assert!(output.contains("Usage: hos"));
}
