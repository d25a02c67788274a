//! Service configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::str::FromStr;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Port to listen on, all interfaces (default: 3000).
    pub port: u16,

    /// Requests accepted per minute before answering 429 (default: 100).
    pub rate_limit_max: u64,

    /// SQLite database file, or `RocksDB` directory with the
    /// `rocksdb-backend` feature (default: "database.db").
    pub db_path: String,

    /// Maximum pooled SQLite connections (default: 5).
    pub db_max_connections: u32,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load `.env` from the working directory, if present, then the
    /// environment. Variables already set win over the file.
    #[must_use]
    pub fn load() -> Self {
        Self::from_env_file(Path::new(".env"))
    }

    /// Load variables from `path` into the environment, then read them.
    #[must_use]
    pub fn from_env_file(path: &Path) -> Self {
        match dotenv::from_path(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "Loaded environment file"),
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "No environment file loaded"),
        }
        Self::from_env()
    }

    /// Load configuration from environment variables.
    ///
    /// Unset variables take their default; values that fail to parse are
    /// logged and replaced by the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            port: parse_or(&lookup, "API_PORT", defaults.port),
            rate_limit_max: parse_or(&lookup, "RATE_LIMIT_MAX", defaults.rate_limit_max),
            db_path: lookup("DB_PATH").unwrap_or(defaults.db_path),
            db_max_connections: parse_or(
                &lookup,
                "DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            ),
            cors_origins: lookup("CORS_ORIGINS").map_or(defaults.cors_origins, |origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
            max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", defaults.max_body_bytes),
            request_timeout_seconds: parse_or(
                &lookup,
                "REQUEST_TIMEOUT_SECONDS",
                defaults.request_timeout_seconds,
            ),
        }
    }

    /// Socket address the server binds to.
    #[must_use]
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    let Some(raw) = lookup(name) else {
        return default;
    };

    raw.trim().parse().unwrap_or_else(|_| {
        tracing::warn!(
            variable = name,
            value = %raw,
            default = %default,
            "Invalid configuration value, using default"
        );
        default
    })
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            rate_limit_max: 100,
            db_path: "database.db".into(),
            db_max_connections: 5,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024, // 1MB
            request_timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(vars: &[(&str, &str)]) -> ServiceConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServiceConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = from_map(&[]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.rate_limit_max, 100);
        assert_eq!(config.db_path, "database.db");
        assert_eq!(config.cors_origins, vec!["*"]);
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn reads_variables() {
        let config = from_map(&[
            ("API_PORT", "8081"),
            ("RATE_LIMIT_MAX", "20"),
            ("DB_PATH", "/var/lib/clientes.db"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("DB_MAX_CONNECTIONS", "2"),
        ]);
        assert_eq!(config.port, 8081);
        assert_eq!(config.rate_limit_max, 20);
        assert_eq!(config.db_path, "/var/lib/clientes.db");
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.db_max_connections, 2);
    }

    #[test]
    fn env_file_values_are_read() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "RATE_LIMIT_MAX=7\nDB_PATH=/tmp/clientes-from-env-file.db\n",
        )
        .unwrap();

        let config = ServiceConfig::from_env_file(&path);
        assert_eq!(config.rate_limit_max, 7);
        assert_eq!(config.db_path, "/tmp/clientes-from-env-file.db");
    }

    #[test]
    fn missing_env_file_is_ignored() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ServiceConfig::from_env_file(&dir.path().join(".env"));
        assert!(config.port > 0);
    }

    #[test]
    fn bad_numbers_fall_back_to_defaults() {
        let config = from_map(&[("API_PORT", "http"), ("REQUEST_TIMEOUT_SECONDS", "-1")]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.request_timeout_seconds, 30);
    }
}
