use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub session: SessionConfig,

    pub security: SecurityConfig,

    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads. 0 means one per CPU core.
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/tracktower.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    /// Origins allowed for credentialed CORS. "*" means reflect whatever
    /// Origin the request carries (cookies rule out a literal wildcard).
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle timeout in minutes. 0 disables expiry: sessions live until
    /// logout (expiry pinned to a far-future sentinel).
    pub idle_timeout_minutes: u64,

    /// Sessions within this many minutes of expiring get extended by the
    /// idle timeout on access. Only meaningful with an idle timeout set.
    pub renewal_window_minutes: u64,

    /// "lax", "strict" or "none".
    pub cookie_same_site: String,

    /// Secure flag on the session cookie. Only honored when the request
    /// actually arrived over HTTPS (transport or x-forwarded-proto).
    pub cookie_secure: bool,

    pub cookie_max_age_days: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: 0,
            renewal_window_minutes: 5,
            cookie_same_site: "lax".to_string(),
            cookie_secure: false,
            cookie_max_age_days: 365,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB.
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations).
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,

    pub min_password_length: usize,

    /// Hours a password reset token stays valid after approval.
    pub reset_token_ttl_hours: i64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            min_password_length: 8,
            reset_token_ttl_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Shared secret for the `-public` admin side-channel endpoints.
    /// Those routes stay disabled while this is unset.
    pub ui_key: Option<String>,

    /// Base URL used in the password-set link handed to the notifier.
    pub client_origin: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                let mut config = Self::load_from_path(path)?;
                config.apply_env_overrides();
                return Ok(config);
            }
        }

        info!("No config file found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Secrets may come from the environment (.env is loaded at startup)
    /// so they stay out of config.toml.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("ADMIN_UI_KEY")
            && !key.is_empty()
        {
            self.admin.ui_key = Some(key);
        }
        if let Ok(origin) = std::env::var("CLIENT_ORIGIN")
            && !origin.is_empty()
        {
            self.admin.client_origin = Some(origin);
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.session.cookie_same_site.as_str() {
            "lax" | "strict" | "none" => {}
            other => anyhow::bail!("Unknown cookie_same_site value: {other}"),
        }

        if self.security.min_password_length == 0 {
            anyhow::bail!("min_password_length must be at least 1");
        }

        if self.security.reset_token_ttl_hours <= 0 {
            anyhow::bail!("reset_token_ttl_hours must be positive");
        }

        Ok(())
    }

    /// The configured idle timeout, or None when sessions never expire.
    #[must_use]
    pub fn idle_timeout(&self) -> Option<chrono::Duration> {
        if self.session.idle_timeout_minutes == 0 {
            None
        } else {
            Some(chrono::Duration::minutes(
                self.session.idle_timeout_minutes as i64,
            ))
        }
    }

    #[must_use]
    pub fn renewal_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session.renewal_window_minutes as i64)
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("tracktower").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".tracktower").join("config.toml"));
        }

        paths
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            session: SessionConfig::default(),
            security: SecurityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.session.cookie_same_site, "lax");
        assert_eq!(config.session.cookie_max_age_days, 365);
        assert!(config.idle_timeout().is_none());
        assert!(config.admin.ui_key.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [session]
            idle_timeout_minutes = 30
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(
            config.idle_timeout(),
            Some(chrono::Duration::minutes(30))
        );

        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn test_rejects_bad_same_site() {
        let mut config = Config::default();
        config.session.cookie_same_site = "sideways".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[session]"));
        assert!(toml_str.contains("[security]"));
    }
}
