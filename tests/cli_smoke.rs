//! CLI smoke tests for Stevedore.

use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the stevedore binary command.
fn stevedore() -> Command {
    Command::cargo_bin("stevedore").unwrap()
}

#[test]
fn test_init_creates_manifest() {
    let tmp = TempDir::new().unwrap();

    stevedore()
        .args(["init"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let manifest = fs::read_to_string(tmp.path().join("stevedore.json")).unwrap();
    assert!(manifest.contains("\"version\": 1"));
}

#[test]
fn test_init_fails_if_manifest_exists() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("stevedore.json"), "{}").unwrap();

    stevedore()
        .args(["init"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_install_requires_manifest() {
    let tmp = TempDir::new().unwrap();

    stevedore()
        .args(["install"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_install_with_empty_manifest_writes_lock() {
    let tmp = TempDir::new().unwrap();

    stevedore()
        .args(["init"])
        .current_dir(tmp.path())
        .assert()
        .success();

    stevedore()
        .args(["install"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let lock = fs::read_to_string(tmp.path().join("stevedore.lock.json")).unwrap();
    assert!(lock.contains("\"dependencies\": []"));
    assert!(tmp.path().join("vendor").is_dir());
}

#[test]
fn test_install_rejects_bad_spec() {
    let tmp = TempDir::new().unwrap();

    stevedore()
        .args(["init"])
        .current_dir(tmp.path())
        .assert()
        .success();

    stevedore()
        .args(["install", "notaspec"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid package spec"));
}

#[test]
fn test_install_local_dependency() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("lib")).unwrap();
    fs::write(tmp.path().join("lib/lib.cfg"), "x\n").unwrap();

    stevedore()
        .args(["init"])
        .current_dir(tmp.path())
        .assert()
        .success();

    stevedore()
        .args(["install", "./lib"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let lock = fs::read_to_string(tmp.path().join("stevedore.lock.json")).unwrap();
    assert!(lock.contains("\"local\""));
    assert!(tmp.path().join("vendor/lib").exists());
}
