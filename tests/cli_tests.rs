use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn fleet_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("fleet"))
}

fn init(temp_dir: &TempDir) -> PathBuf {
    let config_path = temp_dir.path().join("fleet-config");
    fleet_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
    config_path
}

fn fleet_in(config_path: &Path) -> Command {
    let mut cmd = fleet_cmd();
    cmd.args(["-C", config_path.to_str().unwrap()]);
    cmd
}

fn add_trip(config_path: &Path, partner: &str, vehicle: &str, amount: &str, incentive: &str) {
    fleet_in(config_path)
        .args([
            "add", "-p", partner, "-n", vehicle, "-d", "Ravi", "-a", amount, "-i", incentive,
        ])
        .assert()
        .success();
}

#[test]
fn test_help() {
    fleet_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fleet trip ledger"));
}

#[test]
fn test_version() {
    fleet_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fleet"));
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("fleet-config");

    fleet_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized fleet config"));

    // Check files were created
    assert!(config_path.join("config.toml").exists());
    assert!(config_path.join("reports").is_dir());
}

#[test]
fn test_init_fails_if_exists() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);

    fleet_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_status_without_init() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nonexistent");

    fleet_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_list_empty() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);

    fleet_in(&config_path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No trips recorded yet"));
}

#[test]
fn test_add_and_list() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);

    fleet_in(&config_path)
        .args([
            "add", "-p", "acme", "-n", "KA01AB1234", "-d", "Ravi", "-a", "1500", "-i", "200",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added trip for Acme"))
        .stdout(predicate::str::contains("₹200.00"));

    fleet_in(&config_path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Partner: Acme"))
        .stdout(predicate::str::contains("KA01AB1234"))
        .stdout(predicate::str::contains("PAYABLE"))
        .stdout(predicate::str::contains("₹1,700.00"));

    // Data survives across invocations
    assert!(config_path.join("fleet_data.json").exists());
}

#[test]
fn test_add_rejects_duplicate_incentive() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);
    add_trip(&config_path, "Acme", "V1", "100", "50");

    fleet_in(&config_path)
        .args(["add", "-p", "Beta", "-n", "V1", "-d", "Anil", "-a", "80", "-i", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Incentive already added for vehicle 'V1'"));

    fleet_in(&config_path)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Trips:            1"));
}

#[test]
fn test_add_rejects_invalid_amount() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);

    fleet_in(&config_path)
        .args(["add", "-p", "Acme", "-n", "V1", "-d", "Ravi", "-a", "12x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("valid number"));
}

#[test]
fn test_commission_requires_partner() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);

    fleet_in(&config_path)
        .args(["commission", "acme", "30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Partner 'Acme' not found"));
}

#[test]
fn test_commission_reduces_payable() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);
    add_trip(&config_path, "Acme", "V1", "100", "");
    add_trip(&config_path, "Acme", "V2", "200", "50");

    fleet_in(&config_path)
        .args(["commission", "Acme", "30", "-r", "October settlement"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Partner data updated for Acme"));

    fleet_in(&config_path)
        .args(["list", "-p", "acme"])
        .assert()
        .success()
        .stdout(predicate::str::contains("₹320.00"))
        .stdout(predicate::str::contains("Remarks: October settlement"));
}

#[test]
fn test_edit_changes_driver() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);
    add_trip(&config_path, "Acme", "V1", "100", "50");

    fleet_in(&config_path)
        .args(["edit", "Acme", "1", "--driver", "Suresh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated trip 1 for Acme"));

    fleet_in(&config_path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Suresh"))
        .stdout(predicate::str::contains("Ravi").not());

    fleet_in(&config_path)
        .args(["edit", "Acme", "5", "--driver", "Nobody"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Entry not found"));
}

#[test]
fn test_remove_last_trip_drops_partner() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);
    add_trip(&config_path, "Acme", "V1", "100", "");

    fleet_in(&config_path)
        .args(["remove", "Acme", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("has no trips left"));

    fleet_in(&config_path)
        .args(["list", "-p", "Acme"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No trips recorded yet"));
}

#[test]
fn test_clear_requires_confirmation() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);
    add_trip(&config_path, "Acme", "V1", "100", "");

    fleet_in(&config_path)
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("--yes"));

    fleet_in(&config_path)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Trips:            1"));

    fleet_in(&config_path)
        .args(["clear", "--yes"])
        .assert()
        .success();

    fleet_in(&config_path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No trips recorded yet"));
}

#[test]
fn test_report_on_empty_ledger() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);

    fleet_in(&config_path)
        .args(["report", "--from", "01/10/2026", "--to", "31/10/2026"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No data to display"));

    assert!(fs::read_dir(config_path.join("reports")).unwrap().next().is_none());
}

#[test]
fn test_report_rejects_bad_dates() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);
    add_trip(&config_path, "Acme", "V1", "100", "");

    fleet_in(&config_path)
        .args(["report", "--from", "31/10/2026", "--to", "01/10/2026"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date range"));

    fleet_in(&config_path)
        .args(["report", "--from", "Oct 1", "--to", "01/10/2026"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date 'Oct 1'"));
}

#[test]
fn test_reports_archive_commands() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);
    let reports = config_path.join("reports");

    fleet_in(&config_path)
        .arg("reports")
        .assert()
        .success()
        .stdout(predicate::str::contains("No reports generated yet"));

    let name = "Acme--01-10-2026--31-10-2026--10-00-00.pdf";
    fs::write(reports.join(name), b"%PDF-1.7").unwrap();

    fleet_in(&config_path)
        .args(["reports", "--date", "15/10/2026"])
        .assert()
        .success()
        .stdout(predicate::str::contains(name))
        .stdout(predicate::str::contains("01/10/2026 - 31/10/2026"));

    fleet_in(&config_path)
        .args(["reports", "--date", "2026-11-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No reports generated yet"));

    let outbox = temp_dir.path().join("outbox");
    fleet_in(&config_path)
        .args(["share-report", "1", "--to", outbox.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Shared"));
    assert!(outbox.join(name).exists());

    fleet_in(&config_path)
        .args(["delete-report", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Deleted {name}")));
    assert!(!reports.join(name).exists());

    fleet_in(&config_path)
        .args(["delete-report", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_remove_from_data_file_without_ids() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);
    fs::write(
        config_path.join("fleet_data.json"),
        r#"{"form_data":{"Acme":[{"vehicleNumber":"V1","driverName":"Ravi","amount":100,"incentive":50},{"vehicleNumber":"V2","driverName":"Anil","amount":200}]},"partner_meta":{}}"#,
    )
    .unwrap();

    fleet_in(&config_path)
        .args(["remove", "Acme", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed trip 1 (V1, Ravi) from Acme"));

    fleet_in(&config_path)
        .args(["edit", "Acme", "1", "--driver", "Suresh"])
        .assert()
        .success();

    fleet_in(&config_path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Suresh"))
        .stdout(predicate::str::contains("V1").not());
}
