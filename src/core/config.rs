/// Server Configuration
///
/// All settings come from environment variables and are read once at startup:
/// - SERVER_NAME: Name reported in initialize responses (default: "Minimal MCP Server")
/// - SERVER_VERSION: Version reported in initialize responses (default: "1.0.0")
/// - HOST: Bind address (default: "0.0.0.0")
/// - PORT: Listener port (default: 3000)
/// - WORKER_THREADS: HTTP worker count (default: CPU count, capped at 16)

use tracing::warn;

pub const DEFAULT_SERVER_NAME: &str = "Minimal MCP Server";
pub const DEFAULT_SERVER_VERSION: &str = "1.0.0";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
const MAX_DEFAULT_WORKERS: usize = 16;

/// Runtime configuration of the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server name reported to clients (`SERVER_NAME`)
    pub name: String,
    /// Server version reported to clients (`SERVER_VERSION`)
    pub version: String,
    /// Interface to bind (`HOST`)
    pub host: String,
    /// TCP port to bind (`PORT`)
    pub port: u16,
    /// Number of actix worker threads (`WORKER_THREADS`)
    pub workers: usize,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Missing values take their defaults. Malformed numeric values are
    /// logged and replaced by their defaults rather than aborting startup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().unwrap_or_else(|_| {
                warn!(value = %raw, default = DEFAULT_PORT, "invalid PORT, using default");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let workers = lookup("WORKER_THREADS")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or_else(default_workers);

        Self {
            name: lookup("SERVER_NAME").unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string()),
            version: lookup("SERVER_VERSION").unwrap_or_else(|| DEFAULT_SERVER_VERSION.to_string()),
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            workers,
        }
    }

    /// `host:port` string passed to `HttpServer::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// CPU count, capped to avoid excessive context switching.
fn default_workers() -> usize {
    num_cpus::get().clamp(1, MAX_DEFAULT_WORKERS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = ServerConfig::default();
        assert_eq!(config.name, DEFAULT_SERVER_NAME);
        assert_eq!(config.version, DEFAULT_SERVER_VERSION);
        assert_eq!(config.port, 3000);
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert!((1..=MAX_DEFAULT_WORKERS).contains(&config.workers));
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("SERVER_NAME", "calc"),
            ("SERVER_VERSION", "2.0.0"),
            ("WORKER_THREADS", "3"),
        ]);
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.name, "calc");
        assert_eq!(config.version, "2.0.0");
        assert_eq!(config.workers, 3);
    }

    #[test]
    fn malformed_numbers_fall_back() {
        let config = config_from(&[("PORT", "not-a-port"), ("WORKER_THREADS", "0")]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.workers, default_workers());

        let config = config_from(&[("PORT", "70000")]);
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
