//! Server configuration
//!
//! Loaded from a YAML file (path taken from `FILEHOST_CONFIG`, default
//! `config.yaml`). Every key is optional; the `LISTEN` environment variable
//! overrides the bind address.

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
    pub console: ConsoleConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to (e.g. "127.0.0.1:8080")
    pub listen_addr: String,

    /// Seconds a connection may stay silent before one idle tick is counted
    pub idle_timeout_secs: u64,

    /// Consecutive idle ticks tolerated before the connection is closed
    pub max_idle_timeouts: u32,

    /// When false every response carries `Connection: close`
    pub keep_alive: bool,

    /// Upper bound for a request head that has not reached its terminator yet
    pub max_header_bytes: usize,

    /// Largest Content-Length accepted on a request
    pub max_body_bytes: usize,

    /// Seconds one response or broadcast write may take before the client is dropped
    pub write_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory files are served from
    pub root: String,

    /// File served for `/`
    pub index: String,

    /// File served for `GET /admin`
    pub admin_page: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            idle_timeout_secs: 30,
            max_idle_timeouts: 10,
            keep_alive: true,
            max_header_bytes: 64 * 1024,
            max_body_bytes: 1024 * 1024,
            write_timeout_secs: 10,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: "files".to_string(),
            index: "index.html".to_string(),
            admin_page: "admin.html".to_string(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ServerConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

impl Config {
    /// Load configuration from disk and the environment.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("FILEHOST_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut cfg = if Path::new(&path).exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {}", path))?;
            Self::from_yaml(&raw).with_context(|| format!("invalid config file {}", path))?
        } else {
            tracing::debug!(path = %path, "Config file not found, using defaults");
            Self::default()
        };

        if let Ok(listen) = std::env::var("LISTEN") {
            cfg.server.listen_addr = listen;
        }

        Ok(cfg)
    }

    /// Parse configuration from a YAML document.
    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(raw)?;

        if cfg.server.max_idle_timeouts == 0 {
            anyhow::bail!("server.max_idle_timeouts must be at least 1");
        }
        if cfg.server.idle_timeout_secs == 0 {
            anyhow::bail!("server.idle_timeout_secs must be at least 1");
        }
        if cfg.server.write_timeout_secs == 0 {
            anyhow::bail!("server.write_timeout_secs must be at least 1");
        }

        Ok(cfg)
    }
}
