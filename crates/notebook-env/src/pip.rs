//! Pip operations inside a provisioned environment.
//!
//! Three failure classes, decided at the point of occurrence:
//! self-upgrade and manifest installs are best-effort (warn and continue),
//! while a required package that fails to install aborts the run.

use anyhow::{bail, Context, Result};
use log::{info, warn};
use std::path::Path;
use std::process::Stdio;

use crate::progress::{EnvProgressPhase, ProgressHandler};

/// Check whether the interpreter's pip responds to a version query.
pub async fn pip_responds(python: &Path) -> bool {
    let status = tokio::process::Command::new(python)
        .args(["-m", "pip", "--version"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    matches!(status, Ok(status) if status.success())
}

/// Repair pip via `ensurepip`. Returns true when pip responds afterwards.
pub async fn bootstrap_pip(python: &Path, handler: &dyn ProgressHandler) -> bool {
    handler.on_progress(EnvProgressPhase::BootstrappingPip);

    let output = tokio::process::Command::new(python)
        .args(["-m", "ensurepip", "--upgrade"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {
            if pip_responds(python).await {
                upgrade_pip(python, handler).await;
                true
            } else {
                warn!("ensurepip reported success but pip still does not respond");
                false
            }
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("'ensurepip' failed or is unavailable for this interpreter: {stderr}");
            false
        }
        Err(e) => {
            warn!("could not run ensurepip via {:?}: {e}", python);
            false
        }
    }
}

/// Best-effort `pip install --upgrade pip`.
pub async fn upgrade_pip(python: &Path, handler: &dyn ProgressHandler) {
    handler.on_progress(EnvProgressPhase::UpgradingPip);

    let output = tokio::process::Command::new(python)
        .args(["-m", "pip", "install", "--upgrade", "pip"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {}
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("Failed to upgrade pip (continuing): {stderr}");
        }
        Err(e) => warn!("Failed to run pip upgrade (continuing): {e}"),
    }
}

/// Install from a requirements manifest when one exists beside the
/// executable. Failure is a warning; the run continues.
pub async fn install_requirements(python: &Path, manifest: &Path, handler: &dyn ProgressHandler) {
    if !manifest.exists() {
        info!("No requirements manifest at {:?} (skipping)", manifest);
        return;
    }

    info!("Installing dependencies from {:?}", manifest);
    handler.on_progress(EnvProgressPhase::InstallingRequirements {
        manifest: manifest.to_string_lossy().to_string(),
    });

    let output = tokio::process::Command::new(python)
        .args(["-m", "pip", "install", "-r"])
        .arg(manifest)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {}
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            handler.on_progress(EnvProgressPhase::Warning {
                message: format!(
                    "Failed installing from {:?} (continuing): {stderr}",
                    manifest
                ),
            });
        }
        Err(e) => {
            handler.on_progress(EnvProgressPhase::Warning {
                message: format!("Could not run pip for {:?} (continuing): {e}", manifest),
            });
        }
    }
}

/// Install a single required package. Unlike the manifest path, failure
/// here is an error for the caller to treat as fatal.
pub async fn install_package(
    python: &Path,
    package: &str,
    handler: &dyn ProgressHandler,
) -> Result<()> {
    handler.on_progress(EnvProgressPhase::InstallingPackage {
        package: package.to_string(),
    });

    let output = tokio::process::Command::new(python)
        .args(["-m", "pip", "install", package])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .with_context(|| format!("failed to run pip via {:?}", python))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = format!("failed to install '{}': {}", package, stderr);
        handler.on_progress(EnvProgressPhase::Error {
            message: message.clone(),
        });
        bail!(message);
    }

    Ok(())
}

/// Full dependency installation: best-effort pip upgrade, best-effort
/// manifest install, then the required package. Only the last is fatal.
pub async fn install_dependencies(
    python: &Path,
    manifest: &Path,
    required: &str,
    handler: &dyn ProgressHandler,
) -> Result<()> {
    upgrade_pip(python, handler).await;
    install_requirements(python, manifest, handler).await;
    install_package(python, required, handler).await
}
