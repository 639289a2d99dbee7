//! Server configuration, read once from the environment at startup.

use std::path::PathBuf;

/// `ROOMBOOK_DATA_DIR` value that selects an in-memory store.
pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address to bind to (default: "0.0.0.0")
    pub bind: String,
    /// Port to bind to (default: 3000)
    pub port: u16,
    /// WAL directory; `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    /// WAL appends since the last compaction that trigger a new one.
    pub compact_threshold: u64,
    /// Prometheus exporter port; disabled when unset.
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
            data_dir: Some(PathBuf::from("./data")),
            compact_threshold: 1000,
            metrics_port: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unparseable numbers fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let data_dir = match lookup("ROOMBOOK_DATA_DIR") {
            Some(dir) if dir == IN_MEMORY => None,
            Some(dir) => Some(PathBuf::from(dir)),
            None => defaults.data_dir,
        };
        Self {
            bind: lookup("ROOMBOOK_BIND").unwrap_or(defaults.bind),
            port: lookup("ROOMBOOK_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            data_dir,
            compact_threshold: lookup("ROOMBOOK_COMPACT_THRESHOLD")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.compact_threshold),
            metrics_port: lookup("ROOMBOOK_METRICS_PORT").and_then(|s| s.parse().ok()),
        }
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn wal_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("bookings.wal"))
    }
}
