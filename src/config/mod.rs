use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::transcript::retry::{default_language_sets, RetryPolicy};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Retry orchestration settings
    pub retry: RetryConfig,

    /// YouTube client settings
    pub youtube: YoutubeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Video fetched by the `/test` endpoint
    pub test_video_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per request
    pub max_attempts: u32,

    /// Proxy tried on the first attempt; `null` disables it
    pub proxy_url: Option<String>,

    /// Minimum pause between attempts in milliseconds
    pub min_delay_ms: u64,

    /// Maximum pause between attempts in milliseconds
    pub max_delay_ms: u64,

    /// Language preference lists rotated across attempts
    pub language_sets: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// Scheme and host of the YouTube frontend
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            test_video_id: "dQw4w9WgXcQ".to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            proxy_url: Some("socks5://127.0.0.1:9050".to_string()),
            min_delay_ms: 2000,
            max_delay_ms: 5000,
            language_sets: default_language_sets(),
        }
    }
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com".to_string(),
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, the default locations, or create a default one
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config = Self::from_yaml_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            if let Err(e) = config.save(&config_path) {
                tracing::warn!("Could not write default config to {}: {:#}", config_path.display(), e);
            }
            Ok(config)
        }
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::create_dir_all(parent)?;
            }
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // Current directory wins so a checkout can carry its own config
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("yt-transcript-server").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }

        if self.retry.min_delay_ms > self.retry.max_delay_ms {
            anyhow::bail!(
                "retry.min_delay_ms ({}) must not exceed retry.max_delay_ms ({})",
                self.retry.min_delay_ms,
                self.retry.max_delay_ms
            );
        }

        if self.retry.language_sets.is_empty() {
            anyhow::bail!("retry.language_sets must contain at least one list");
        }

        if let Some(proxy) = &self.retry.proxy_url {
            url::Url::parse(proxy)
                .with_context(|| format!("Invalid retry.proxy_url: {}", proxy))?;
        }

        url::Url::parse(&self.youtube.base_url)
            .with_context(|| format!("Invalid youtube.base_url: {}", self.youtube.base_url))?;

        Ok(())
    }

    /// Retry policy described by the `retry` section
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            min_delay: Duration::from_millis(self.retry.min_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            language_sets: self.retry.language_sets.clone(),
        }
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Listen Address: {}:{}", self.server.host, self.server.port);
        println!("  Test Video: {}", self.server.test_video_id);
        println!("  Max Attempts: {}", self.retry.max_attempts);
        match &self.retry.proxy_url {
            Some(proxy) => println!("  Proxy: {}", proxy),
            None => println!("  Proxy: disabled"),
        }
        println!("  Backoff: {}-{} ms", self.retry.min_delay_ms, self.retry.max_delay_ms);
        for (i, set) in self.retry.language_sets.iter().enumerate() {
            let label = if set.is_empty() { "any".to_string() } else { set.join(", ") };
            println!("  Languages #{}: {}", i + 1, label);
        }
        println!("  YouTube: {}", self.youtube.base_url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.retry.language_sets.len(), 5);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml_str("server:\n  port: 8080\nretry:\n  proxy_url: null\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.retry.proxy_url.is_none());
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retry.min_delay_ms = 6000;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retry.language_sets.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retry.proxy_url = Some("not a url".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_policy_conversion() {
        let policy = Config::default().retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.min_delay, Duration::from_secs(2));
        assert_eq!(policy.max_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_load_writes_default_then_reads_it_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let first = Config::load(Some(&path)).unwrap();
        assert!(path.exists());

        let second = Config::load(Some(&path)).unwrap();
        assert_eq!(first.server.port, second.server.port);
        assert_eq!(first.retry.language_sets, second.retry.language_sets);
    }
}
