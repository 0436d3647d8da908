use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::Endpoint;
use crate::sync::SyncConfig;

const BASE_URL_ENV: &str = "POSTVIEW_BASE_URL";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub sync: SyncSection,
  pub ui: UiConfig,
  pub connectivity: ConnectivityConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  /// Query parameter carrying the owner filter
  pub filter_param: String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "https://jsonplaceholder.typicode.com/posts".to_string(),
      filter_param: "userId".to_string(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncSection {
  pub dedup_interval_ms: u64,
  pub max_attempts: u32,
  pub retry_interval_ms: u64,
  pub revalidate_on_focus: bool,
  pub revalidate_on_reconnect: bool,
  pub revalidate_if_stale: bool,
}

impl Default for SyncSection {
  fn default() -> Self {
    Self {
      dedup_interval_ms: 10_000,
      max_attempts: 3,
      retry_interval_ms: 5_000,
      revalidate_on_focus: true,
      revalidate_on_reconnect: true,
      revalidate_if_stale: true,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
  /// Header title
  pub title: String,
  /// Quiet period before filter input is applied
  pub debounce_ms: u64,
  /// Loading time after which the slow connection notice is shown
  pub stall_ms: u64,
}

impl Default for UiConfig {
  fn default() -> Self {
    Self {
      title: "Posts".to_string(),
      debounce_ms: 500,
      stall_ms: 3_000,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
  pub enabled: bool,
  pub probe_interval_ms: u64,
}

impl Default for ConnectivityConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      probe_interval_ms: 5_000,
    }
  }
}

impl ConnectivityConfig {
  pub fn probe_interval(&self) -> Duration {
    Duration::from_millis(self.probe_interval_ms)
  }
}

impl UiConfig {
  pub fn debounce(&self) -> Duration {
    Duration::from_millis(self.debounce_ms)
  }

  pub fn stall(&self) -> Duration {
    Duration::from_millis(self.stall_ms)
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./postview.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/postview/config.yaml
  ///
  /// Defaults are used when no file is found. `POSTVIEW_BASE_URL`
  /// overrides the API base URL.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
      config.api.base_url = base_url;
    }
    config.validate()?;

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("postview.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("postview").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file is valid and means all defaults
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))
  }

  fn validate(&self) -> Result<()> {
    if self.sync.max_attempts == 0 {
      return Err(eyre!("sync.max_attempts must be at least 1"));
    }
    if self.api.filter_param.trim().is_empty() {
      return Err(eyre!("api.filter_param must not be empty"));
    }
    Ok(())
  }

  pub fn endpoint(&self) -> Result<Endpoint> {
    Endpoint::new(&self.api.base_url, self.api.filter_param.clone())
  }

  pub fn sync_config(&self) -> SyncConfig {
    SyncConfig {
      dedup_interval: Duration::from_millis(self.sync.dedup_interval_ms),
      max_attempts: self.sync.max_attempts,
      retry_interval: Duration::from_millis(self.sync.retry_interval_ms),
      revalidate_on_focus: self.sync.revalidate_on_focus,
      revalidate_on_reconnect: self.sync.revalidate_on_reconnect,
      revalidate_if_stale: self.sync.revalidate_if_stale,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_match_sync_defaults() {
    let config = Config::default();
    let sync = config.sync_config();
    let expected = SyncConfig::default();

    assert_eq!(sync.dedup_interval, expected.dedup_interval);
    assert_eq!(sync.max_attempts, 3);
    assert_eq!(sync.retry_interval, Duration::from_secs(5));
    assert_eq!(config.ui.debounce(), Duration::from_millis(500));
    assert_eq!(config.ui.stall(), Duration::from_millis(3000));
    assert_eq!(config.api.filter_param, "userId");
  }

  #[test]
  fn test_partial_file_keeps_other_defaults() {
    let config = Config::parse(
      r#"
api:
  base_url: http://localhost:3000/posts
sync:
  max_attempts: 5
ui:
  title: Team posts
"#,
    )
    .unwrap();

    assert_eq!(config.api.base_url, "http://localhost:3000/posts");
    assert_eq!(config.api.filter_param, "userId");
    assert_eq!(config.sync.max_attempts, 5);
    assert_eq!(config.sync.retry_interval_ms, 5_000);
    assert_eq!(config.ui.title, "Team posts");
    assert_eq!(config.ui.debounce_ms, 500);
    assert!(config.connectivity.enabled);
  }

  #[test]
  fn test_empty_file_is_defaults() {
    let config = Config::parse("  \n").unwrap();
    assert_eq!(config.ui.title, "Posts");
  }

  #[test]
  fn test_invalid_yaml_is_error() {
    assert!(Config::parse("sync: [not, a, map]").is_err());
  }

  #[test]
  fn test_validate_rejects_zero_attempts() {
    let mut config = Config::default();
    config.sync.max_attempts = 0;
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_endpoint_from_config() {
    let config = Config::default();
    let endpoint = config.endpoint().unwrap();
    assert_eq!(
      endpoint.base().as_str(),
      "https://jsonplaceholder.typicode.com/posts"
    );
  }

  #[test]
  fn test_missing_explicit_path_is_error() {
    assert!(Config::load(Some(Path::new("/nonexistent/postview.yaml"))).is_err());
  }
}
