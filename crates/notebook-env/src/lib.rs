//! Python virtual environment provisioning with progress reporting.
//!
//! This crate provides the environment lifecycle used by the `nbrun` CLI:
//!
//! - Virtualenv creation via `python -m venv`, with reuse of an existing
//!   environment as the fast path
//! - Pip health checking and repair via `ensurepip`, escalating to a full
//!   recreation of the environment when repair fails
//! - Dependency installation from a requirements manifest (best-effort) and
//!   of individually required packages (mandatory)
//! - A progress reporting trait for environment lifecycle events
//!
//! # Progress Reporting
//!
//! All environment operations accept a [`ProgressHandler`] to report phases
//! like venv creation, pip bootstrap, and package installation. Consumers
//! implement this trait to route progress to their UI; [`LogHandler`] routes
//! everything to the `log` crate.
//!
//! ```ignore
//! use notebook_env::{venv, LogHandler};
//!
//! let handler = LogHandler;
//! let env = venv::provision(&base_python, &venv_dir, &handler).await?;
//! ```

pub mod pip;
pub mod progress;
pub mod venv;

// Re-export key types
pub use progress::{EnvProgressPhase, LogHandler, ProgressHandler};
pub use venv::Venv;
