use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ENV_API_URL: &str = "QBIT_WARDEN_API_URL";
pub const ENV_USERNAME: &str = "QBIT_WARDEN_USERNAME";
pub const ENV_PASSWORD: &str = "QBIT_WARDEN_PASSWORD";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_max_seeders")]
    pub max_seeders: u32,
    #[serde(default = "default_max_filesize_bytes")]
    pub max_filesize_bytes: u64,
    #[serde(default = "default_disk_floor_gb")]
    pub disk_floor_gb: u64,
    #[serde(default = "default_disk_path")]
    pub disk_path: PathBuf,
    #[serde(default = "default_skip_trackers")]
    pub skip_trackers: Vec<String>,
    #[serde(default = "default_upload_limit")]
    pub upload_limit: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BudgetConfig {
    /// Bytes allowed per direction within one clock hour
    #[serde(default = "default_hourly_limit_bytes")]
    pub hourly_limit_bytes: u64,
}

/// Job cadences, in seconds
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_fast_cadence")]
    pub upload_throttle: u64,
    #[serde(default = "default_fast_cadence")]
    pub transfer_budget: u64,
    #[serde(default = "default_fast_cadence")]
    pub seeder_cap: u64,
    #[serde(default = "default_fast_cadence")]
    pub filesize_cap: u64,
    #[serde(default = "default_disk_cadence")]
    pub disk_floor: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Status endpoint port; no listener when unset
    pub port: Option<u16>,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "qbittorrent-script/1.0".to_string()
}

fn default_max_seeders() -> u32 {
    3
}

fn default_max_filesize_bytes() -> u64 {
    50_000_000_000_000 // 50 TB
}

fn default_disk_floor_gb() -> u64 {
    5
}

fn default_disk_path() -> PathBuf {
    PathBuf::from("/")
}

fn default_skip_trackers() -> Vec<String> {
    vec!["tracker.pterclub.com".to_string()]
}

fn default_upload_limit() -> u64 {
    125_000_000 // 125 MB/s
}

fn default_hourly_limit_bytes() -> u64 {
    450_000_000_000 // 450 GB
}

fn default_fast_cadence() -> u64 {
    5
}

fn default_disk_cadence() -> u64 {
    60
}

fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_console() -> bool {
    false
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: None,
            password: None,
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_seeders: default_max_seeders(),
            max_filesize_bytes: default_max_filesize_bytes(),
            disk_floor_gb: default_disk_floor_gb(),
            disk_path: default_disk_path(),
            skip_trackers: default_skip_trackers(),
            upload_limit: default_upload_limit(),
        }
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            hourly_limit_bytes: default_hourly_limit_bytes(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            upload_throttle: default_fast_cadence(),
            transfer_budget: default_fast_cadence(),
            seeder_cap: default_fast_cadence(),
            filesize_cap: default_fast_cadence(),
            disk_floor: default_disk_cadence(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: None,
            num_threads: default_num_threads(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: default_console(),
        }
    }
}

impl PolicyConfig {
    /// Disk floor in bytes (decimal gigabytes)
    pub fn disk_floor_bytes(&self) -> u64 {
        self.disk_floor_gb.saturating_mul(1_000_000_000)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&content)
    }

    /// Parse without validating; credentials may still arrive from the
    /// environment.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Resolve the configuration used at startup.
    ///
    /// An explicitly given path must exist. Without one, `config.toml` is used
    /// when present and built-in defaults otherwise. Environment overrides are
    /// applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with(explicit, |key| std::env::var(key).ok())
    }

    /// `load` with an injectable environment lookup
    pub fn load_with<F>(explicit: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let fallback = Path::new("config.toml");
                if fallback.exists() {
                    Self::from_file(fallback)?
                } else {
                    Config::default()
                }
            }
        };

        config.apply_env_overrides(lookup);
        config.validate()?;

        Ok(config)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.client.base_url = url;
        }
        if let Some(username) = lookup(ENV_USERNAME) {
            self.client.username = Some(username);
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.client.password = Some(password);
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate client config
        if self.client.base_url.is_empty() {
            bail!("client.base_url must not be empty");
        }

        if !self.client.base_url.starts_with("http://") && !self.client.base_url.starts_with("https://") {
            bail!(
                "client.base_url '{}' must start with http:// or https://",
                self.client.base_url
            );
        }

        if self.client.request_timeout == 0 {
            bail!("client.request_timeout must be greater than 0");
        }

        if self.client.username.is_some() != self.client.password.is_some() {
            bail!("client.username and client.password must be set together");
        }

        // Validate policy config
        if self.policy.max_filesize_bytes == 0 {
            bail!("policy.max_filesize_bytes must be greater than 0");
        }

        if self.policy.upload_limit == 0 {
            bail!("policy.upload_limit must be greater than 0");
        }

        if self.budget.hourly_limit_bytes == 0 {
            bail!("budget.hourly_limit_bytes must be greater than 0");
        }

        // Validate schedule config
        let cadences = [
            ("upload_throttle", self.schedule.upload_throttle),
            ("transfer_budget", self.schedule.transfer_budget),
            ("seeder_cap", self.schedule.seeder_cap),
            ("filesize_cap", self.schedule.filesize_cap),
            ("disk_floor", self.schedule.disk_floor),
        ];
        for (name, seconds) in cadences {
            if seconds == 0 {
                bail!("schedule.{} must be greater than 0", name);
            }
        }

        if let Some(port) = self.server.port {
            if port == 0 {
                bail!("Server port must be greater than 0");
            }
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();

        assert_eq!(config.client.base_url, "http://localhost:9000");
        assert_eq!(config.policy.max_seeders, 3);
        assert_eq!(config.policy.max_filesize_bytes, 50_000_000_000_000);
        assert_eq!(config.policy.disk_floor_bytes(), 5_000_000_000);
        assert_eq!(config.policy.skip_trackers, vec!["tracker.pterclub.com".to_string()]);
        assert_eq!(config.policy.upload_limit, 125_000_000);
        assert_eq!(config.budget.hourly_limit_bytes, 450_000_000_000);
        assert_eq!(config.schedule.upload_throttle, 5);
        assert_eq!(config.schedule.transfer_budget, 5);
        assert_eq!(config.schedule.seeder_cap, 5);
        assert_eq!(config.schedule.filesize_cap, 5);
        assert_eq!(config.schedule.disk_floor, 60);
        assert!(config.server.port.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [client]
            base_url = "http://qbit.lan:8080"

            [policy]
            max_seeders = 10
            skip_trackers = ["a.example", "b.example"]
            "#,
        )
        .expect("Failed to parse config");

        assert_eq!(config.client.base_url, "http://qbit.lan:8080");
        assert_eq!(config.policy.max_seeders, 10);
        assert_eq!(config.policy.skip_trackers.len(), 2);
        assert_eq!(config.policy.upload_limit, 125_000_000);
        assert_eq!(config.schedule.disk_floor, 60);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9100\n\n[logging]\nformat = \"console\"").unwrap();

        let config = Config::from_file(file.path()).expect("Failed to load config");

        assert_eq!(config.server.port, Some(9100));
        assert_eq!(config.logging.format, "console");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/qbit-warden.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(|key| match key {
            ENV_API_URL => Some("http://10.0.0.2:9000".to_string()),
            ENV_USERNAME => Some("admin".to_string()),
            ENV_PASSWORD => Some("hunter2".to_string()),
            _ => None,
        });

        assert_eq!(config.client.base_url, "http://10.0.0.2:9000");
        assert_eq!(config.client.username.as_deref(), Some("admin"));
        assert_eq!(config.client.password.as_deref(), Some("hunter2"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_password_from_env_completes_file_credentials() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[client]\nusername = \"admin\"").unwrap();

        let config = Config::load_with(Some(file.path()), |key| match key {
            ENV_PASSWORD => Some("secret".to_string()),
            _ => None,
        })
        .expect("env password should complete the credentials");

        assert_eq!(config.client.username.as_deref(), Some("admin"));
        assert_eq!(config.client.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_load_rejects_incomplete_credentials() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[client]\nusername = \"admin\"").unwrap();

        let result = Config::load_with(Some(file.path()), |_| None);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_cadence() {
        let config = Config::from_toml("[schedule]\nseeder_cap = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_username_without_password() {
        let config = Config::from_toml("[client]\nusername = \"admin\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_invalid_log_level() {
        let config = Config::from_toml("[logging]\nlevel = \"verbose\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = Config::from_toml("[client]\nbase_url = \"localhost:9000\"\n").unwrap();
        assert!(config.validate().is_err());
    }
}
