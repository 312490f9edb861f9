use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 5000;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── ServerConfig ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory holding the SQLite database (`{data_dir}/todod.db`) and
    /// the optional `config.toml`.
    pub data_dir: PathBuf,
    /// Tracing env-filter string, e.g. "info" or "todod=debug".
    pub log: String,
    /// Bind address for the HTTP server (TODOD_BIND env var, default: "127.0.0.1").
    pub bind_address: String,
    /// Log output format: "pretty" (default) | "json" (structured for log aggregators).
    pub log_format: String,
}

impl ServerConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        // Load TOML as the lowest-priority override layer
        let toml = load_toml(&data_dir).unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let bind_address = bind_address
            .or(std::env::var("TODOD_BIND").ok().filter(|s| !s.is_empty()))
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);

        let log_format = std::env::var("TODOD_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());

        Self {
            port,
            data_dir,
            log,
            bind_address,
            log_format,
        }
    }

    /// Path of the SQLite database file inside `data_dir`.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("todod.db")
    }
}

// ─── TOML overrides ───────────────────────────────────────────────────────────

/// `{data_dir}/config.toml` — all fields are optional overrides.
#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    /// HTTP listen port (default: 5000).
    port: Option<u16>,
    /// Tracing env-filter string (default: "info").
    log: Option<String>,
    /// Bind address (default: "127.0.0.1"; use "0.0.0.0" for LAN access).
    bind_address: Option<String>,
    /// Log output format: "pretty" | "json".
    log_format: Option<String>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/todod
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("todod");
        }
    }
    #[cfg(target_os = "linux")]
    {
        // $XDG_DATA_HOME/todod or ~/.local/share/todod
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("todod");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("todod");
        }
    }
    #[cfg(target_os = "windows")]
    {
        // %APPDATA%\todod
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("todod");
        }
    }
    // Fallback
    PathBuf::from(".todod")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_args_win_over_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "port = 6000\nlog = \"debug\"\n",
        )
        .unwrap();

        let cfg = ServerConfig::new(
            Some(7000),
            Some(dir.path().to_path_buf()),
            None,
            Some("0.0.0.0".to_string()),
        );
        assert_eq!(cfg.port, 7000, "CLI port overrides TOML");
        assert_eq!(cfg.log, "debug", "TOML fills fields the CLI left unset");
        assert_eq!(cfg.bind_address, "0.0.0.0");
    }

    #[test]
    fn defaults_apply_without_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = ServerConfig::new(None, Some(dir.path().to_path_buf()), None, None);
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.log, "info");
        assert_eq!(cfg.bind_address, "127.0.0.1");
        assert_eq!(cfg.db_path(), dir.path().join("todod.db"));
    }

    #[test]
    fn malformed_toml_falls_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "port = \"not a number").unwrap();
        let cfg = ServerConfig::new(None, Some(dir.path().to_path_buf()), None, None);
        assert_eq!(cfg.port, 5000);
    }
}
