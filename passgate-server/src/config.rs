//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.
//! Relying Party settings (`PASSGATE_*`) are loaded separately by
//! `passgate_core::RelyingPartyBuilder::from_env`.

use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3000)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in KB (default: 64)
    pub body_limit_kb: usize,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded from env)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 20)
    pub rate_limit_burst: u32,
    /// Interval between expired-session sweeps in seconds (default: 60)
    pub session_sweep_secs: u64,
    /// Use deterministic mock entropy for challenges (default: false, never in production)
    pub mock_entropy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            host: [127, 0, 0, 1],
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_kb: 64,
            timeout_secs: 30,
            rate_limit_enabled: false, // Disabled by default (for tests)
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
            session_sweep_secs: 60,
            mock_entropy: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let host = lookup("HOST")
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or(defaults.host);

        let allowed_origins = lookup("ALLOWED_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let body_limit_kb = lookup("BODY_LIMIT_KB")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.body_limit_kb);

        let timeout_secs = lookup("REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        let rate_limit_per_sec = lookup("RATE_LIMIT_PER_SEC")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.rate_limit_per_sec);

        let rate_limit_burst = lookup("RATE_LIMIT_BURST")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.rate_limit_burst);

        // Rate limiting enabled by default in production, can be disabled with RATE_LIMIT_ENABLED=false
        let rate_limit_enabled = lookup("RATE_LIMIT_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let session_sweep_secs = lookup("SESSION_SWEEP_SECS")
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(defaults.session_sweep_secs);

        let mock_entropy = lookup("MOCK_ENTROPY")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Self {
            port,
            host,
            allowed_origins,
            body_limit_kb,
            timeout_secs,
            rate_limit_enabled,
            rate_limit_per_sec,
            rate_limit_burst,
            session_sweep_secs,
            mock_entropy,
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.body_limit_kb, 64);
        assert!(!config.rate_limit_enabled);
        assert!(!config.mock_entropy);
    }

    #[test]
    fn test_from_env_enables_rate_limit_by_default() {
        let config = Config::from_lookup(lookup(&[]));
        assert!(config.rate_limit_enabled);
        assert!(config.allowed_origins.is_none());
    }

    #[test]
    fn test_from_env_values() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("HOST", "0.0.0.0"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
            ("RATE_LIMIT_ENABLED", "FALSE"),
            ("SESSION_SWEEP_SECS", "0"),
            ("MOCK_ENTROPY", "true"),
        ]));

        assert_eq!(config.socket_addr(), SocketAddr::from(([0, 0, 0, 0], 8080)));
        assert_eq!(
            config.allowed_origins,
            Some(vec!["https://a.example".to_string(), "https://b.example".to_string()])
        );
        assert!(!config.rate_limit_enabled);
        assert_eq!(config.session_sweep_secs, 60);
        assert!(config.mock_entropy);
    }

    #[test]
    fn test_garbage_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup(&[("PORT", "http"), ("BODY_LIMIT_KB", "-1")]));
        assert_eq!(config.port, 3000);
        assert_eq!(config.body_limit_kb, 64);
    }
}
