// SPDX-License-Identifier: Apache-2.0

use assert_cmd::Command;
use std::path::Path;
use std::process::Output;

fn souk(db: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_souk"))
        .arg("--db")
        .arg(db)
        .args(args)
        .output()
        .expect("run souk")
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("utf8 stdout")
}

#[test]
fn init_admin_seed_and_feed_round_trip() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let db = tmp.path().join("souk.db");

    let output = souk(&db, &["init-db"]);
    assert!(
        output.status.success(),
        "init-db failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout_text(&output).contains("database ready"));

    let output = souk(
        &db,
        &[
            "create-admin",
            "--email",
            "ops@souk.example",
            "--name",
            "Ops Admin",
            "--password",
            "super-secret-9",
        ],
    );
    assert!(output.status.success());
    assert!(stdout_text(&output).contains("admin created"));

    // Same email again rotates credentials instead of failing.
    let output = souk(
        &db,
        &[
            "create-admin",
            "--email",
            "ops@souk.example",
            "--name",
            "Ops Admin",
            "--password",
            "rotated-secret-9",
        ],
    );
    assert!(output.status.success());
    assert!(stdout_text(&output).contains("admin updated"));

    let output = souk(&db, &["seed"]);
    assert!(output.status.success());
    assert!(stdout_text(&output).contains("seeded 2 categories"));

    let output = souk(&db, &["seed"]);
    assert!(output.status.success());
    assert!(stdout_text(&output).contains("already seeded"));

    let output = souk(&db, &["vendor", "list"]);
    assert!(output.status.success());
    let listing = stdout_text(&output);
    assert!(listing.contains("north-traders"));
    assert!(listing.contains("coast-crafts"));

    let feed_path = tmp.path().join("feed.xml");
    let output = Command::new(env!("CARGO_BIN_EXE_souk"))
        .arg("--db")
        .arg(&db)
        .args(["feed", "--base-url", "https://souk.example", "--out"])
        .arg(&feed_path)
        .output()
        .expect("run feed");
    assert!(output.status.success());
    let xml = std::fs::read_to_string(&feed_path).expect("feed file");
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains("<g:price>140.00 USD</g:price>"));
    assert!(xml.contains("<g:brand>North Traders</g:brand>"));
    // Platform-owned inventory carries the store brand.
    assert!(xml.contains("<g:brand>Souk</g:brand>"));
}

#[test]
fn json_mode_swaps_prose_for_one_payload() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let db = tmp.path().join("souk.db");
    assert!(souk(&db, &["init-db"]).status.success());

    let output = souk(
        &db,
        &[
            "--json",
            "create-admin",
            "--email",
            "ops@souk.example",
            "--name",
            "Ops Admin",
            "--password",
            "super-secret-9",
        ],
    );
    assert!(output.status.success());
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("create-admin payload");
    assert_eq!(payload["created"], true);
    assert_eq!(payload["email"], "ops@souk.example");
    assert!(payload["id"].as_str().is_some());
}

#[test]
fn vendor_moderation_changes_status() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let db = tmp.path().join("souk.db");
    assert!(souk(&db, &["init-db"]).status.success());
    assert!(souk(&db, &["seed"]).status.success());

    let output = souk(&db, &["--json", "vendor", "list"]);
    assert!(output.status.success());
    let vendors: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("vendor list payload");
    let north = vendors
        .as_array()
        .expect("vendor array")
        .iter()
        .find(|v| v["slug"] == "north-traders")
        .expect("seeded vendor");
    let id = north["id"].as_str().expect("vendor id");

    let output = souk(&db, &["vendor", "suspend", "--id", id]);
    assert!(output.status.success());
    assert!(stdout_text(&output).contains("-> suspended"));

    let output = souk(&db, &["--json", "vendor", "list", "--status", "suspended"]);
    assert!(output.status.success());
    let suspended: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("suspended list payload");
    let rows = suspended.as_array().expect("vendor array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["slug"], "north-traders");
}

#[test]
fn missing_order_exits_with_the_not_found_code() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let db = tmp.path().join("souk.db");
    assert!(souk(&db, &["init-db"]).status.success());

    let output = souk(&db, &["orders", "show", "--id", "SOUK-20260101-XXXX"]);
    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8(output.stderr).expect("utf8 stderr");
    assert!(stderr.contains("not found"));
}

#[test]
fn bad_vendor_id_exits_with_the_validation_code() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let db = tmp.path().join("souk.db");
    assert!(souk(&db, &["init-db"]).status.success());

    let output = souk(&db, &["vendor", "approve", "--id", "not-a-uuid"]);
    assert_eq!(output.status.code(), Some(3));
}
