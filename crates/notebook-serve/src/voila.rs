//! Detached Voilà server launching.
//!
//! The server is spawned fire-and-forget: detached from this process's
//! session, with all standard streams closed, and no handle retained. Its
//! lifetime belongs to the operating system and the user from that point on.

use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// PyPI package that provides the server.
pub const PACKAGE: &str = "voila";

/// Launch parameters for a Voilà server process.
#[derive(Debug, Clone)]
pub struct VoilaServer {
    /// Interpreter inside the provisioned environment.
    pub python: PathBuf,
    /// Notebook to serve.
    pub notebook: PathBuf,
    pub host: String,
    pub port: u16,
}

impl VoilaServer {
    /// URL the served notebook will be reachable at.
    pub fn url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }

    /// Arguments passed to the environment's interpreter.
    fn args(&self) -> Vec<String> {
        vec![
            "-m".to_string(),
            "voila".to_string(),
            self.notebook.to_string_lossy().to_string(),
            "--no-browser".to_string(),
            "--port".to_string(),
            self.port.to_string(),
            "--Voila.ip".to_string(),
            self.host.clone(),
            // Hide code cells
            "--Voila.strip_sources=True".to_string(),
        ]
    }

    /// Spawn the server detached and return its pid.
    ///
    /// On Unix the child gets its own process group and null stdio; a new
    /// process group rather than a full new session, which with the
    /// standard streams closed is enough for the server to outlive this
    /// process and its terminal. On Windows it gets the
    /// `DETACHED_PROCESS` creation flag. The child handle is dropped on
    /// return, so closing this process leaves the server running.
    pub fn spawn_detached(&self) -> Result<u32> {
        let mut cmd = Command::new(&self.python);
        cmd.args(self.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const DETACHED_PROCESS: u32 = 0x0000_0008;
            cmd.creation_flags(DETACHED_PROCESS);
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn voila via {:?}", self.python))?;
        let pid = child.id();
        info!("Voilà started (pid {pid}), detached from this session");
        Ok(pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> VoilaServer {
        VoilaServer {
            python: PathBuf::from("/envs/.venv/bin/python"),
            notebook: PathBuf::from("/work/report.ipynb"),
            host: "127.0.0.1".to_string(),
            port: 8866,
        }
    }

    #[test]
    fn test_url_pattern() {
        assert_eq!(server().url(), "http://127.0.0.1:8866/");
    }

    #[test]
    fn test_args_serve_detached_and_hidden() {
        let args = server().args();
        assert_eq!(args[0], "-m");
        assert_eq!(args[1], "voila");
        assert!(args.contains(&"/work/report.ipynb".to_string()));
        assert!(args.contains(&"--no-browser".to_string()));
        assert!(args.contains(&"--Voila.strip_sources=True".to_string()));

        let port_idx = args.iter().position(|a| a == "--port").unwrap();
        assert_eq!(args[port_idx + 1], "8866");
        let ip_idx = args.iter().position(|a| a == "--Voila.ip").unwrap();
        assert_eq!(args[ip_idx + 1], "127.0.0.1");
    }
}
