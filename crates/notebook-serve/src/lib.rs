//! Server-side plumbing for serving a notebook with Voilà.
//!
//! This crate covers everything between a provisioned environment and a
//! browser tab:
//!
//! - TCP port allocation (bind-then-release scan with an OS-assigned
//!   ephemeral fallback)
//! - Detached, fire-and-forget launching of the Voilà server process
//! - Readiness polling of the served port
//! - Opening the default browser

pub mod browser;
pub mod port;
pub mod voila;

// Re-export commonly used items
pub use browser::open_browser;
pub use port::{find_free_port, wait_for_port};
pub use voila::VoilaServer;
