//! Virtualenv provisioning, repair, and recreation.
//!
//! The environment lives in a fixed directory (by default `.venv` beside the
//! executable) and is reused across runs when present. Reuse is the cache
//! hit; the invalidation rule is the pip health check in [`provision`]: an
//! environment whose pip does not respond gets one `ensurepip` repair and,
//! failing that, one destroy-and-recreate before the run is aborted.

use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::pip;
use crate::progress::{EnvProgressPhase, ProgressHandler};

/// A provisioned virtual environment on disk.
#[derive(Debug, Clone)]
pub struct Venv {
    pub venv_path: PathBuf,
    pub python_path: PathBuf,
}

/// Compute the interpreter path inside a venv, following the platform's
/// directory convention.
pub fn python_executable(venv_path: &Path) -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        venv_path.join("Scripts").join("python.exe")
    }
    #[cfg(not(target_os = "windows"))]
    {
        venv_path.join("bin").join("python")
    }
}

/// Directory the executable lives in; the venv and the requirements
/// manifest sit beside it.
pub fn app_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default location of the managed environment.
pub fn default_venv_dir() -> PathBuf {
    app_dir().join(".venv")
}

/// Locate a base interpreter on PATH for creating the venv.
pub async fn find_system_python() -> Result<PathBuf> {
    let candidates: &[&str] = if cfg!(target_os = "windows") {
        &["python", "python3"]
    } else {
        &["python3", "python"]
    };

    for candidate in candidates {
        let probe = tokio::process::Command::new(candidate)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        if matches!(probe, Ok(status) if status.success()) {
            return Ok(PathBuf::from(candidate));
        }
    }

    Err(anyhow!(
        "no Python interpreter found on PATH (tried {})",
        candidates.join(", ")
    ))
}

/// Create the venv if missing; reuse it untouched when present.
pub async fn ensure_venv(
    base_python: &Path,
    venv_path: &Path,
    handler: &dyn ProgressHandler,
) -> Result<()> {
    if venv_path.exists() {
        handler.on_progress(EnvProgressPhase::CacheHit {
            env_path: venv_path.to_string_lossy().to_string(),
        });
        return Ok(());
    }

    info!("Creating virtual environment at {:?}", venv_path);
    handler.on_progress(EnvProgressPhase::CreatingVenv);
    create_venv(base_python, venv_path).await
}

/// Destroy the venv and build it again from scratch.
pub async fn recreate_venv(
    base_python: &Path,
    venv_path: &Path,
    handler: &dyn ProgressHandler,
) -> Result<()> {
    info!("Recreating virtual environment at {:?}", venv_path);
    handler.on_progress(EnvProgressPhase::Recreating {
        env_path: venv_path.to_string_lossy().to_string(),
    });

    if venv_path.exists() {
        // A partial removal just makes the create below fail with a clearer
        // error, so removal errors are not fatal on their own.
        tokio::fs::remove_dir_all(venv_path).await.ok();
    }

    create_venv(base_python, venv_path).await
}

async fn create_venv(base_python: &Path, venv_path: &Path) -> Result<()> {
    let output = tokio::process::Command::new(base_python)
        .arg("-m")
        .arg("venv")
        .arg(venv_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .with_context(|| format!("failed to run {:?} -m venv", base_python))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("failed to create virtual environment: {}", stderr);
    }

    Ok(())
}

/// Full provisioning lifecycle: ensure the venv exists, verify its
/// interpreter, and make sure pip responds.
///
/// An unresponsive pip gets one `ensurepip` repair and, if that fails, one
/// recreate-and-retry. After that the environment is unrecoverable from
/// here and the error carries a remediation hint for the common
/// Debian/Ubuntu cause.
pub async fn provision(
    base_python: &Path,
    venv_path: &Path,
    handler: &dyn ProgressHandler,
) -> Result<Venv> {
    handler.on_progress(EnvProgressPhase::Starting {
        env_path: venv_path.to_string_lossy().to_string(),
    });

    ensure_venv(base_python, venv_path, handler).await?;

    let python_path = python_executable(venv_path);
    if !python_path.exists() {
        bail!(
            "no Python interpreter inside the virtual environment at {:?}",
            venv_path
        );
    }

    if !pip_usable(&python_path, handler).await {
        warn!("Could not bootstrap pip; recreating the virtual environment");
        recreate_venv(base_python, venv_path, handler).await?;

        if !python_path.exists() {
            bail!(
                "no Python interpreter inside the recreated virtual environment at {:?}",
                venv_path
            );
        }

        if !pip_usable(&python_path, handler).await {
            bail!(
                "still no usable pip after recreating the virtual environment at {:?}\n\
                 On Debian/Ubuntu, make sure the venv module is installed:\n\
                 \x20   sudo apt-get update && sudo apt-get install -y python3-venv",
                venv_path
            );
        }
    }

    handler.on_progress(EnvProgressPhase::Ready {
        env_path: venv_path.to_string_lossy().to_string(),
        python_path: python_path.to_string_lossy().to_string(),
    });

    Ok(Venv {
        venv_path: venv_path.to_path_buf(),
        python_path,
    })
}

/// Pip health check with one repair attempt.
async fn pip_usable(python: &Path, handler: &dyn ProgressHandler) -> bool {
    pip::pip_responds(python).await || pip::bootstrap_pip(python, handler).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::LogHandler;

    #[test]
    fn test_python_executable_convention() {
        let path = python_executable(Path::new("/tmp/env"));
        #[cfg(target_os = "windows")]
        assert!(path.ends_with("Scripts/python.exe"));
        #[cfg(not(target_os = "windows"))]
        assert!(path.ends_with("bin/python"));
    }

    #[test]
    fn test_default_venv_dir_name() {
        assert_eq!(
            default_venv_dir().file_name().unwrap().to_str().unwrap(),
            ".venv"
        );
    }

    #[tokio::test]
    async fn test_ensure_venv_reuses_existing_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let venv_path = temp_dir.path().join(".venv");
        std::fs::create_dir(&venv_path).unwrap();
        let marker = venv_path.join("marker.txt");
        std::fs::write(&marker, "keep me").unwrap();

        // The base interpreter is never invoked on the reuse path.
        ensure_venv(Path::new("definitely-not-python"), &venv_path, &LogHandler)
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&marker).unwrap(), "keep me");
    }

    #[tokio::test]
    async fn test_ensure_venv_create_fails_without_interpreter() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let venv_path = temp_dir.path().join(".venv");

        let result = ensure_venv(Path::new("definitely-not-python"), &venv_path, &LogHandler).await;
        assert!(result.is_err());
    }
}
