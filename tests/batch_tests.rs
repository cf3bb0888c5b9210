//! Batch fetch coordinator tests.
//!
//! Drive whole catalogs against local fixture sources, including the two
//! end-to-end scenarios: a clean run and a tampered-checksum run.

mod helpers;

use deploykit::batch::fetch_all;
use deploykit::catalog::MediaCatalog;
use deploykit::checksum::sha256_file;
use helpers::{assert_file_content, assert_no_temp, TestEnv};

/// Canonical catalog JSON pointing at local fixture paths.
fn catalog_json(entries: &[(&str, &str, &str, &str, Option<&str>)]) -> String {
    let mut drivers = Vec::new();
    let mut updates = Vec::new();
    let mut applications = Vec::new();

    for (section, id, source, target, checksum) in entries {
        let checksum = match checksum {
            Some(c) => format!(r#", "checksum": "{c}""#),
            None => String::new(),
        };
        let entry =
            format!(r#"{{"id": "{id}", "source": "{source}", "target": "{target}"{checksum}}}"#);
        match *section {
            "drivers" => drivers.push(entry),
            "updates" => updates.push(entry),
            "applications" => applications.push(entry),
            other => panic!("unknown section {other}"),
        }
    }

    format!(
        r#"{{"drivers": [{}], "updates": [{}], "applications": [{}]}}"#,
        drivers.join(","),
        updates.join(","),
        applications.join(",")
    )
}

#[test]
fn test_partial_failure_reports_every_failed_id() {
    let env = TestEnv::new();
    let ok_a = env.write_fixture("a.bin", b"aaa");
    let ok_b = env.write_fixture("b.bin", b"bbb");
    let missing = env.fixtures.join("gone.bin");

    let payload = catalog_json(&[
        ("updates", "a", ok_a.to_str().unwrap(), "a.bin", None),
        ("updates", "gone", missing.to_str().unwrap(), "gone.bin", None),
        ("applications", "b", ok_b.to_str().unwrap(), "b.bin", None),
    ]);
    let catalog = MediaCatalog::parse(&payload).unwrap();

    let report = fetch_all(&catalog, &env.media_root, true).unwrap();

    assert!(report.is_failure());
    assert_eq!(report.succeeded.len(), 2);
    assert_eq!(report.failed, vec!["gone".to_string()]);
    assert!(env.media_root.join("a.bin").exists());
    assert!(env.media_root.join("b.bin").exists());
    assert!(!env.media_root.join("gone.bin").exists());
}

#[test]
fn test_entries_fetched_in_category_order() {
    let env = TestEnv::new();
    let src = env.write_fixture("x.bin", b"x");
    let src = src.to_str().unwrap();

    // Applications declared first; drivers must still fetch first.
    let payload = format!(
        r#"{{
            "applications": [{{"id": "app", "source": "{src}", "target": "app.bin"}}],
            "updates": [{{"id": "upd", "source": "{src}", "target": "upd.bin"}}],
            "drivers": [{{"id": "drv", "source": "{src}", "target": "drv.bin"}}]
        }}"#
    );
    let catalog = MediaCatalog::parse(&payload).unwrap();

    let report = fetch_all(&catalog, &env.media_root, true).unwrap();

    let ids: Vec<_> = report.succeeded.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, ["drv", "upd", "app"]);
}

#[test]
fn test_skip_checksums_ignores_declared_digest() {
    let env = TestEnv::new();
    let src = env.write_fixture("app.exe", b"bytes");
    let wrong = "2222222222222222222222222222222222222222222222222222222222222222";

    let payload = catalog_json(&[(
        "applications",
        "app",
        src.to_str().unwrap(),
        "app.exe",
        Some(wrong),
    )]);
    let catalog = MediaCatalog::parse(&payload).unwrap();

    // verify_checksums = false: the wrong digest must not matter.
    let report = fetch_all(&catalog, &env.media_root, false).unwrap();
    assert!(!report.is_failure());
    assert_file_content(&env.media_root.join("app.exe"), b"bytes");
}

#[test]
fn test_scenario_clean_run() {
    // One driver entry plus one checksummed application entry against
    // reachable fixtures: two files written, zero failures.
    let env = TestEnv::new();
    let driver_src = env.write_fixture("net.inf", b"driver bits");
    let app_src = env.write_fixture("demo.exe", b"app bits");
    let app_digest = sha256_file(&app_src).unwrap();

    let payload = catalog_json(&[
        (
            "drivers",
            "net",
            driver_src.to_str().unwrap(),
            "drivers/net.inf",
            None,
        ),
        (
            "applications",
            "demo",
            app_src.to_str().unwrap(),
            "apps/demo.exe",
            Some(&app_digest),
        ),
    ]);
    let catalog = MediaCatalog::parse(&payload).unwrap();

    let report = fetch_all(&catalog, &env.media_root, true).unwrap();

    assert!(!report.is_failure());
    assert_eq!(report.succeeded.len(), 2);
    assert_file_content(&env.media_root.join("drivers/net.inf"), b"driver bits");
    assert_file_content(&env.media_root.join("apps/demo.exe"), b"app bits");
}

#[test]
fn test_scenario_tampered_application() {
    // Same catalog, but the application fixture's bytes were altered
    // after its digest was recorded: driver present, app absent, exactly
    // one failed identifier.
    let env = TestEnv::new();
    let driver_src = env.write_fixture("net.inf", b"driver bits");
    let app_src = env.write_fixture("demo.exe", b"app bits");
    let app_digest = sha256_file(&app_src).unwrap();
    std::fs::write(&app_src, b"tampered bits").unwrap();

    let payload = catalog_json(&[
        (
            "drivers",
            "net",
            driver_src.to_str().unwrap(),
            "drivers/net.inf",
            None,
        ),
        (
            "applications",
            "demo",
            app_src.to_str().unwrap(),
            "apps/demo.exe",
            Some(&app_digest),
        ),
    ]);
    let catalog = MediaCatalog::parse(&payload).unwrap();

    let report = fetch_all(&catalog, &env.media_root, true).unwrap();

    assert!(report.is_failure());
    assert_eq!(report.failed, vec!["demo".to_string()]);
    assert!(env.media_root.join("drivers/net.inf").exists());
    let app_dest = env.media_root.join("apps/demo.exe");
    assert!(!app_dest.exists());
    assert_no_temp(&app_dest);
}

#[test]
fn test_empty_catalog_is_success() {
    let env = TestEnv::new();
    let catalog = MediaCatalog::parse("{}").unwrap();

    let report = fetch_all(&catalog, &env.media_root, true).unwrap();
    assert!(!report.is_failure());
    assert!(report.succeeded.is_empty());
}

#[test]
fn test_legacy_catalog_fetches_as_applications() {
    let env = TestEnv::new();
    let src = env.write_fixture("legacy.bin", b"legacy");
    let payload = format!(
        r#"{{"items": [{{"id": "legacy.bin", "url": "{}"}}]}}"#,
        src.display()
    );
    let catalog = MediaCatalog::parse(&payload).unwrap();

    let report = fetch_all(&catalog, &env.media_root, true).unwrap();

    assert!(!report.is_failure());
    // Legacy target equals the id.
    assert_file_content(&env.media_root.join("legacy.bin"), b"legacy");
}
