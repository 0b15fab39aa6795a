//! TCP port allocation and readiness probing.

use anyhow::{Context, Result};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

/// First candidate port for the scan (Voilà's default).
pub const DEFAULT_PORT_START: u16 = 8866;

/// Number of candidate ports to try before falling back to an ephemeral one.
pub const DEFAULT_PORT_TRIES: u16 = 50;

/// Overall readiness deadline after the server is spawned.
pub const READY_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);
const RETRY_INTERVAL: Duration = Duration::from_millis(300);

/// Find a TCP port on `host` that can be bound.
///
/// Scans `start..start + max_tries` with a bind-then-release probe (no
/// socket is held past the call), then falls back to binding port 0 and
/// reading back the OS-assigned port. Only OS-level resource exhaustion
/// makes this fail.
pub fn find_free_port(host: &str, start: u16, max_tries: u16) -> Result<u16> {
    for port in start..start.saturating_add(max_tries) {
        if TcpListener::bind((host, port)).is_ok() {
            return Ok(port);
        }
    }

    let listener = TcpListener::bind((host, 0))
        .with_context(|| format!("could not bind an ephemeral port on {host}"))?;
    Ok(listener.local_addr()?.port())
}

/// Poll `host:port` until it accepts a TCP connection or `timeout` passes.
///
/// Each attempt uses a short connect timeout; attempts are spaced by a
/// short sleep. Returns false on deadline, which callers treat as a
/// warning rather than a failure (the server may just be slow to start).
pub async fn wait_for_port(host: &str, port: u16, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if probe_port(host, port).await {
            return true;
        }
        tokio::time::sleep(RETRY_INTERVAL).await;
    }
    false
}

/// Single connect attempt; the blocking connect runs on a worker thread.
async fn probe_port(host: &str, port: u16) -> bool {
    let addr = format!("{host}:{port}");
    tokio::task::spawn_blocking(move || {
        let Ok(mut addrs) = addr.to_socket_addrs() else {
            return false;
        };
        addrs.any(|a| TcpStream::connect_timeout(&a, CONNECT_TIMEOUT).is_ok())
    })
    .await
    .unwrap_or(false)
}
