//! Progress reporting for environment operations.
//!
//! Provides [`EnvProgressPhase`] events covering the lifecycle of virtualenv
//! provisioning (creation, pip repair, package installation) and a
//! [`ProgressHandler`] trait that consumers implement to route events to
//! their UI layer.

use serde::{Deserialize, Serialize};

/// Progress phases during environment preparation.
///
/// These events cover the full lifecycle from cache check through
/// ready-to-use. Serializable for transport to other frontends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum EnvProgressPhase {
    /// Starting environment preparation.
    Starting { env_path: String },
    /// Reusing an existing environment (fast path).
    CacheHit { env_path: String },
    /// Creating the virtual environment.
    CreatingVenv,
    /// Repairing pip via `ensurepip`.
    BootstrappingPip,
    /// Destroying and rebuilding the environment after a failed repair.
    Recreating { env_path: String },
    /// Best-effort upgrade of pip itself.
    UpgradingPip,
    /// Installing from a requirements manifest.
    InstallingRequirements { manifest: String },
    /// Installing a single required package.
    InstallingPackage { package: String },
    /// Environment is ready.
    Ready {
        env_path: String,
        python_path: String,
    },
    /// A non-fatal problem occurred; execution continues.
    Warning { message: String },
    /// An error occurred.
    Error { message: String },
}

/// Trait for receiving environment progress events.
///
/// Implement this to route progress to your UI layer.
pub trait ProgressHandler: Send + Sync {
    /// Called for each progress phase during environment preparation.
    fn on_progress(&self, phase: EnvProgressPhase);
}

/// Log-only progress handler.
///
/// Writes progress phases to the `log` crate, warnings and errors at their
/// matching levels.
pub struct LogHandler;

impl ProgressHandler for LogHandler {
    fn on_progress(&self, phase: EnvProgressPhase) {
        match &phase {
            EnvProgressPhase::Starting { env_path } => {
                log::info!("Preparing virtual environment at {env_path}");
            }
            EnvProgressPhase::CacheHit { env_path } => {
                log::info!("Reusing existing virtual environment at {env_path}");
            }
            EnvProgressPhase::CreatingVenv => {
                log::info!("Creating virtual environment...");
            }
            EnvProgressPhase::BootstrappingPip => {
                log::info!("Bootstrapping pip with ensurepip...");
            }
            EnvProgressPhase::Recreating { env_path } => {
                log::info!("Recreating virtual environment at {env_path}");
            }
            EnvProgressPhase::UpgradingPip => {
                log::info!("Upgrading pip...");
            }
            EnvProgressPhase::InstallingRequirements { manifest } => {
                log::info!("Installing dependencies from {manifest}");
            }
            EnvProgressPhase::InstallingPackage { package } => {
                log::info!("Ensuring '{package}' is installed...");
            }
            EnvProgressPhase::Ready {
                env_path,
                python_path,
            } => {
                log::info!("Ready: env={env_path} python={python_path}");
            }
            EnvProgressPhase::Warning { message } => {
                log::warn!("{message}");
            }
            EnvProgressPhase::Error { message } => {
                log::error!("{message}");
            }
        }
    }
}
