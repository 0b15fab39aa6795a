//! Behavior tests for pip operations against stub interpreters.
//!
//! These use tiny shell scripts standing in for a venv's python so the
//! success/failure paths run without a real interpreter or network access.

#![cfg(unix)]

use std::path::{Path, PathBuf};

use notebook_env::{pip, LogHandler};
use tempfile::TempDir;

/// Write an executable stub "python" that exits with the given code.
fn stub_python(dir: &Path, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("python");
    std::fs::write(&path, format!("#!/bin/sh\nexit {exit_code}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

#[tokio::test]
async fn test_pip_responds_with_healthy_interpreter() {
    let temp_dir = TempDir::new().unwrap();
    let python = stub_python(temp_dir.path(), 0);
    assert!(pip::pip_responds(&python).await);
}

#[tokio::test]
async fn test_pip_responds_with_broken_interpreter() {
    let temp_dir = TempDir::new().unwrap();
    let python = stub_python(temp_dir.path(), 1);
    assert!(!pip::pip_responds(&python).await);
}

#[tokio::test]
async fn test_bootstrap_pip_reports_failure() {
    let temp_dir = TempDir::new().unwrap();
    let python = stub_python(temp_dir.path(), 1);
    assert!(!pip::bootstrap_pip(&python, &LogHandler).await);
}

#[tokio::test]
async fn test_install_package_failure_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let python = stub_python(temp_dir.path(), 1);
    let result = pip::install_package(&python, "voila", &LogHandler).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_install_dependencies_skips_missing_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let python = stub_python(temp_dir.path(), 0);
    let manifest = temp_dir.path().join("requirements.txt");

    // No manifest on disk: the run must still reach (and here pass) the
    // required-package install.
    pip::install_dependencies(&python, &manifest, "voila", &LogHandler)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_install_dependencies_fatal_only_for_required_package() {
    let temp_dir = TempDir::new().unwrap();
    let python = stub_python(temp_dir.path(), 1);
    let manifest = temp_dir.path().join("requirements.txt");
    std::fs::write(&manifest, "requests\n").unwrap();

    // Everything fails with this stub: the upgrade and manifest installs
    // are downgraded to warnings, so the error must come from the required
    // package alone.
    let err = pip::install_dependencies(&python, &manifest, "voila", &LogHandler)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("voila"));
}
