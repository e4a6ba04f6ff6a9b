use std::net::SocketAddr;

use anyhow::Context;
use chatgate_core::AdmissionConfig;
use serde::Deserialize;

pub const CONFIG_PATH_VAR: &str = "CHATGATE_CONFIG";
pub const BIND_ADDR_VAR: &str = "CHATGATE_BIND_ADDR";
pub const TRUST_PROXY_VAR: &str = "CHATGATE_TRUST_PROXY";

/// An account seeded into the user store at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(flatten)]
    pub admission: AdmissionConfig,
    /// Honour `X-Forwarded-For` / `X-Real-IP` when identifying clients.
    #[serde(default)]
    pub trust_proxy: bool,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default = "default_maintenance_interval_secs")]
    pub maintenance_interval_secs: u64,
    /// Unlocked login-throttle entries idle this long are dropped.
    #[serde(default = "default_login_idle_ms")]
    pub login_idle_ms: u64,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            admission: AdmissionConfig::default(),
            trust_proxy: false,
            max_body_bytes: default_max_body_bytes(),
            maintenance_interval_secs: default_maintenance_interval_secs(),
            login_idle_ms: default_login_idle_ms(),
            users: Vec::new(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_maintenance_interval_secs() -> u64 {
    60
}

fn default_login_idle_ms() -> u64 {
    15 * 60 * 1000
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Reads the optional TOML file named by `CHATGATE_CONFIG`, then applies
    /// environment overrides through `lookup`.
    pub fn load_from<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config file {path}"))?;
                toml::from_str::<ServerConfig>(&contents)
                    .with_context(|| format!("parsing config file {path}"))?
            }
            None => ServerConfig::default(),
        };

        config.admission.apply_env(&lookup);

        if let Some(addr) = lookup(BIND_ADDR_VAR) {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("{BIND_ADDR_VAR}={addr:?} is not a socket address"))?;
        }

        if let Some(flag) = lookup(TRUST_PROXY_VAR) {
            config.trust_proxy = matches!(flag.trim(), "1" | "true" | "yes");
        }

        config.admission.validate()?;

        if config.admission.cors.origins.is_empty() {
            tracing::debug!("CORS allow-list is empty; cross-origin API calls get no CORS headers");
        }
        if config.users.is_empty() {
            tracing::warn!("No [[users]] configured. Accounts exist only after signup.");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_file_or_env() {
        let config = ServerConfig::load_from(env(&[])).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.admission.rate_limit.max_requests, 100);
        assert_eq!(config.admission.rate_limit.window_ms, 60_000);
        assert!(config.admission.cors.origins.is_empty());
        assert!(!config.trust_proxy);
        assert!(config.users.is_empty());
    }

    #[test]
    fn env_overrides_admission_settings() {
        let config = ServerConfig::load_from(env(&[
            ("RATE_LIMIT_MAX", "3"),
            ("RATE_LIMIT_WINDOW_MS", "5000"),
            ("CORS_ORIGINS", "https://app.example.com,https://other.com"),
            ("CHATGATE_BIND_ADDR", "127.0.0.1:8081"),
            ("CHATGATE_TRUST_PROXY", "true"),
        ]))
        .unwrap();

        assert_eq!(config.admission.rate_limit.max_requests, 3);
        assert_eq!(config.admission.rate_limit.window_ms, 5000);
        assert_eq!(config.admission.cors.origins.len(), 2);
        assert_eq!(config.bind_addr, "127.0.0.1:8081".parse().unwrap());
        assert!(config.trust_proxy);
    }

    #[test]
    fn loads_toml_file_then_env_wins() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("chatgate.toml");
        fs::write(
            &path,
            r#"
bind_addr = "127.0.0.1:4000"
trust_proxy = true

[rate_limit]
max_requests = 7
window_ms = 1000

[cors]
origins = ["https://app.example.com"]

[lockout]
max_failures = 5

[[users]]
email = "test@example.com"
name = "Test User"
password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaA"
"#,
        )
        .unwrap();
        let path_str = path.to_str().unwrap().to_string();

        let config = ServerConfig::load_from(env(&[
            ("CHATGATE_CONFIG", path_str.as_str()),
            ("RATE_LIMIT_MAX", "9"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:4000".parse().unwrap());
        assert!(config.trust_proxy);
        assert_eq!(config.admission.rate_limit.max_requests, 9);
        assert_eq!(config.admission.rate_limit.window_ms, 1000);
        assert_eq!(config.admission.cors.origins, vec!["https://app.example.com"]);
        assert_eq!(config.admission.lockout.max_failures, 5);
        assert_eq!(config.admission.lockout.lock_seconds, 10);
        assert_eq!(config.users.len(), 1);
        assert_eq!(config.users[0].email, "test@example.com");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let result =
            ServerConfig::load_from(env(&[("CHATGATE_CONFIG", "/nonexistent/chatgate.toml")]));
        assert!(result.is_err());
    }

    #[test]
    fn bad_bind_addr_is_an_error() {
        let result = ServerConfig::load_from(env(&[("CHATGATE_BIND_ADDR", "not-an-addr")]));
        assert!(result.is_err());
    }

    #[test]
    fn invalid_admission_values_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("chatgate.toml");
        fs::write(&path, "[lockout]\nlock_seconds = 0\n").unwrap();
        let path_str = path.to_str().unwrap().to_string();

        let result = ServerConfig::load_from(env(&[("CHATGATE_CONFIG", path_str.as_str())]));
        assert!(result.is_err());
    }
}
