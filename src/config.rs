//! Server configuration
//!
//! Read from environment variables; relative paths are resolved against
//! the current directory.

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::api::websocket::hub::{DEFAULT_SEND_TIMEOUT, DEFAULT_SESSION_BUFFER};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5080";
pub const DEFAULT_DB_FILE: &str = "todos.jsonl";
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:5173";

/// Settings for `todo-server`
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    /// Allowed CORS origin, `*` for any
    pub frontend_origin: String,
    pub session_buffer: usize,
    pub send_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5080)),
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            frontend_origin: DEFAULT_FRONTEND_ORIGIN.to_string(),
            session_buffer: DEFAULT_SESSION_BUFFER,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Load from `TODO_BIND_ADDR`, `TODO_DB_PATH`, `FRONTEND_ORIGIN`,
    /// `TODO_SESSION_BUFFER` and `TODO_SEND_TIMEOUT_MS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let current_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        let bind_addr = parse_or("TODO_BIND_ADDR", lookup("TODO_BIND_ADDR"), defaults.bind_addr);
        let db_path = resolve_path(
            &current_dir,
            &lookup("TODO_DB_PATH").unwrap_or_else(|| DEFAULT_DB_FILE.to_string()),
        );
        let frontend_origin = lookup("FRONTEND_ORIGIN").unwrap_or(defaults.frontend_origin);
        let session_buffer = parse_or(
            "TODO_SESSION_BUFFER",
            lookup("TODO_SESSION_BUFFER"),
            defaults.session_buffer,
        );
        let send_timeout = lookup("TODO_SEND_TIMEOUT_MS")
            .map(|v| parse_or("TODO_SEND_TIMEOUT_MS", Some(v), 0u64))
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.send_timeout);

        Self {
            bind_addr,
            db_path,
            frontend_origin,
            session_buffer,
            send_timeout,
        }
    }
}

/// Parse an optional variable, falling back (with a warning) on bad input
pub(crate) fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(key, value = %value, "ignoring unparsable setting");
                default
            }
        },
    }
}

fn resolve_path(base: &Path, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
