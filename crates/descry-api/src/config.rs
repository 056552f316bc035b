//! Server configuration.

use descry_core::defaults;

/// Listener and storage settings for the API process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::SERVER_HOST.to_string(),
            port: defaults::SERVER_PORT,
            database_url: defaults::DATABASE_URL.to_string(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `HOST` | `0.0.0.0` |
    /// | `PORT` | `8000` |
    /// | `DATABASE_URL` | `sqlite://descry_queue.db` |
    pub fn from_env() -> Self {
        let host =
            std::env::var(defaults::ENV_HOST).unwrap_or_else(|_| defaults::SERVER_HOST.to_string());
        let port = std::env::var(defaults::ENV_PORT)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::SERVER_PORT);
        let database_url = std::env::var(defaults::ENV_DATABASE_URL)
            .unwrap_or_else(|_| defaults::DATABASE_URL.to_string());
        Self {
            host,
            port,
            database_url,
        }
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bind_addr() {
        assert_eq!(ServerConfig::default().bind_addr(), "0.0.0.0:8000");
    }
}
