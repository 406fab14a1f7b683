//! Runtime settings: defaults, then an optional TOML file, then `AGENTOS_*` environment variables.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_PAGE_SIZE: u64 = 25;
pub const MAX_PAGE_SIZE: u64 = 500;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Which [`ServiceClient`](crate::ServiceClient) backs the console.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceMode {
    /// Talk to the backend over HTTP.
    #[default]
    Http,
    /// Serve the embedded demo data set. Never chosen implicitly.
    Fixture,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
    pub page_size: u64,
    pub poll_interval: Duration,
    pub mode: ServiceMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            timeout: Duration::from_secs(30),
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval: Duration::from_secs(5),
            mode: ServiceMode::Http,
        }
    }
}

/// On-disk shape; every key optional.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    base_url: Option<String>,
    api_token: Option<String>,
    timeout_secs: Option<u64>,
    page_size: Option<u64>,
    poll_secs: Option<u64>,
    mode: Option<ServiceMode>,
}

impl Settings {
    /// Loads settings from `path` (if given) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = Settings::default();
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("AGENTOS_CONFIG").ok().map(Into::into));
        if let Some(path) = path {
            let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            settings.merge_toml(&raw)?;
        }
        settings.merge_env(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Overlays values from a TOML document.
    pub fn merge_toml(&mut self, raw: &str) -> Result<(), ConfigError> {
        let file: FileSettings = toml::from_str(raw)?;
        if let Some(base_url) = file.base_url {
            self.base_url = base_url;
        }
        if file.api_token.is_some() {
            self.api_token = file.api_token;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(page_size) = file.page_size {
            self.page_size = page_size;
        }
        if let Some(secs) = file.poll_secs {
            self.poll_interval = Duration::from_secs(secs);
        }
        if let Some(mode) = file.mode {
            self.mode = mode;
        }
        Ok(())
    }

    /// Overlays `AGENTOS_*` variables read through `lookup`.
    pub fn merge_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup("AGENTOS_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(token) = lookup("AGENTOS_TOKEN") {
            self.api_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(secs) = env_u64(&lookup, "AGENTOS_TIMEOUT_SECS")? {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(page_size) = env_u64(&lookup, "AGENTOS_PAGE_SIZE")? {
            self.page_size = page_size;
        }
        if let Some(secs) = env_u64(&lookup, "AGENTOS_POLL_SECS")? {
            self.poll_interval = Duration::from_secs(secs);
        }
        if let Some(mode) = lookup("AGENTOS_MODE") {
            self.mode = match mode.to_ascii_lowercase().as_str() {
                "http" => ServiceMode::Http,
                "fixture" => ServiceMode::Fixture,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "AGENTOS_MODE".to_string(),
                        value: mode,
                    })
                }
            };
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                key: "page_size".to_string(),
                value: self.page_size.to_string(),
            });
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "poll_secs".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn env_u64<F>(lookup: &F, key: &str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
    }
}
