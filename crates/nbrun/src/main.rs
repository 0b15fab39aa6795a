//! nbrun CLI entry point.
//!
//! Provisions a virtual environment beside the executable, installs the
//! requirements manifest and Voilà into it, then serves the given notebook
//! from a detached background process and opens the browser once the port
//! accepts connections.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Parser;
use log::{info, warn};

use notebook_env::{pip, venv, LogHandler};
use notebook_serve::browser::open_browser;
use notebook_serve::port::{
    find_free_port, wait_for_port, DEFAULT_PORT_START, DEFAULT_PORT_TRIES, READY_TIMEOUT,
};
use notebook_serve::voila::{VoilaServer, PACKAGE};

#[derive(Parser, Debug)]
#[command(name = "nbrun")]
#[command(version, about = "Serve a notebook with Voilà from a local virtual environment")]
struct Cli {
    /// Path to the .ipynb notebook to serve
    notebook: PathBuf,

    /// Host interface to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind (default: auto-find)
    #[arg(long)]
    port: Option<u16>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Validate the notebook argument before any environment or network action.
fn validate_notebook(path: &Path) -> Result<PathBuf> {
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let is_ipynb = resolved
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("ipynb"))
        .unwrap_or(false);
    if !resolved.exists() || !is_ipynb {
        bail!(
            "notebook not found or not a .ipynb file: {}",
            resolved.display()
        );
    }
    Ok(resolved)
}

/// Shorten a path for display by replacing home directory with ~
fn shorten_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(relative) = path.strip_prefix(&home) {
            return format!("~/{}", relative.display());
        }
    }
    path.display().to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let notebook = validate_notebook(&cli.notebook)?;

    let venv_dir = venv::default_venv_dir();
    info!("Using virtual environment at {}", shorten_path(&venv_dir));

    let base_python = venv::find_system_python().await?;
    let handler = LogHandler;
    let env = venv::provision(&base_python, &venv_dir, &handler).await?;

    let manifest = venv::app_dir().join("requirements.txt");
    pip::install_dependencies(&env.python_path, &manifest, PACKAGE, &handler).await?;

    let port = match cli.port {
        Some(port) => port,
        None => find_free_port(&cli.host, DEFAULT_PORT_START, DEFAULT_PORT_TRIES)?,
    };

    let server = VoilaServer {
        python: env.python_path.clone(),
        notebook,
        host: cli.host.clone(),
        port,
    };
    let url = server.url();

    info!("Starting Voilà at {url}");
    server.spawn_detached()?;

    if wait_for_port(&cli.host, port, READY_TIMEOUT).await {
        info!("Voilà is up, opening your browser...");
        open_browser(&url);
    } else {
        warn!("Timed out waiting for Voilà; it may still be starting.");
        println!("Open the notebook manually at: {url}");
    }

    println!("Voilà is running in the background (detached). Stop it with your OS process tools.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_notebook_rejects_missing_path() {
        let result = validate_notebook(Path::new("/definitely/not/here.ipynb"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_notebook_rejects_wrong_extension() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("report.txt");
        std::fs::write(&path, "{}").unwrap();
        assert!(validate_notebook(&path).is_err());
    }

    #[test]
    fn test_validate_notebook_accepts_ipynb() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("report.ipynb");
        std::fs::write(&path, "{}").unwrap();
        assert!(validate_notebook(&path).is_ok());
    }

    #[test]
    fn test_validate_notebook_extension_is_case_insensitive() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("report.IPYNB");
        std::fs::write(&path, "{}").unwrap();
        assert!(validate_notebook(&path).is_ok());
    }

    #[test]
    fn test_shorten_path_replaces_home() {
        if let Some(home) = dirs::home_dir() {
            let shortened = shorten_path(&home.join("notebooks"));
            assert_eq!(shortened, "~/notebooks");
        }
    }
}
