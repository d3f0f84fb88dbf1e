use assert_cmd::Command;
use desk_audit::JsonlActivityLog;
use desk_schemas::Actor;
use predicates::prelude::*;
use serde_json::json;

fn write_chain(path: &std::path::Path) {
    let log = JsonlActivityLog::open(path, true).unwrap();
    let actor = Actor::new(5, "reception");
    log.append(&actor, "payment_applied", json!({"booking_id": 1, "amount": "2000.00"}))
        .unwrap();
    log.append(&actor, "payment_applied", json!({"booking_id": 1, "amount": "3000.00"}))
        .unwrap();
    log.append(&actor, "booking_status_changed", json!({"booking_id": 1, "to": "checked_out"}))
        .unwrap();
}

#[test]
fn intact_log_verifies() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("activity.jsonl");
    write_chain(&path);

    Command::cargo_bin("desk-cli")
        .unwrap()
        .args(["audit", "verify", "--path", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("audit_chain=valid lines=3"));
}

#[test]
fn edited_entry_fails_verification() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("activity.jsonl");
    write_chain(&path);

    let content = std::fs::read_to_string(&path).unwrap();
    let tampered = content.replacen("3000.00", "300.00", 1);
    assert_ne!(content, tampered);
    std::fs::write(&path, tampered).unwrap();

    Command::cargo_bin("desk-cli")
        .unwrap()
        .args(["audit", "verify", "--path", path.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("audit_chain=broken line=2"))
        .stderr(predicate::str::contains("AUDIT_CHAIN_BROKEN"));
}
