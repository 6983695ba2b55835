use crate::error::{PurgeError, Result};
use crate::executor::RetryPolicy;
use crate::resolver::AllowList;
use crate::types::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE: &str = "vpurge.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ApiConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "https://api.verkada.com".to_string()
}

fn default_timeout() -> u64 {
    5
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

// ---------------------------------------------------------------------------
// AuthConfig
// ---------------------------------------------------------------------------

/// Names the environment variables credentials are read from. Secrets never
/// live in the config file itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_api_key_env() -> String {
    "VERKADA_API_KEY".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
        }
    }
}

// ---------------------------------------------------------------------------
// RateConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateConfig {
    /// Calls permitted per window. The vendor documents 500 per minute.
    #[serde(default = "default_rate_limit")]
    pub limit: u32,
    #[serde(default = "default_window")]
    pub window_seconds: u64,
}

fn default_rate_limit() -> u32 {
    500
}

fn default_window() -> u64 {
    60
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            limit: default_rate_limit(),
            window_seconds: default_window(),
        }
    }
}

impl RateConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

// ---------------------------------------------------------------------------
// RetryConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total HTTP calls a single delete may make while throttled.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
    #[serde(default = "default_backoff")]
    pub backoff_ms: u64,
}

fn default_max_retries() -> u32 {
    10
}

fn default_base_delay() -> u64 {
    250
}

fn default_backoff() -> u64 {
    250
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay(),
            backoff_ms: default_backoff(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// AllowConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllowConfig {
    #[serde(default)]
    pub users: AllowList,
    #[serde(default)]
    pub persons: AllowList,
    #[serde(default)]
    pub plates: AllowList,
}

impl AllowConfig {
    pub fn for_kind(&self, kind: ResourceKind) -> &AllowList {
        match kind {
            ResourceKind::Users => &self.users,
            ResourceKind::Persons => &self.persons,
            ResourceKind::Plates => &self.plates,
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub org_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate: RateConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default)]
    pub allow: AllowConfig,
}

fn default_version() -> u32 {
    1
}

fn default_max_workers() -> usize {
    16
}

impl Config {
    pub fn new(org_id: impl Into<String>) -> Self {
        Self {
            version: 1,
            org_id: org_id.into(),
            api: ApiConfig::default(),
            auth: AuthConfig::default(),
            rate: RateConfig::default(),
            retry: RetryConfig::default(),
            max_workers: default_max_workers(),
            allow: AllowConfig::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PurgeError::ConfigNotFound(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut error = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
        };

        if self.org_id.trim().is_empty() {
            error("org_id is empty".to_string());
        }
        if self.rate.limit == 0 {
            error("rate.limit is 0: no call would ever be permitted".to_string());
        }
        if self.rate.window_seconds == 0 {
            error("rate.window_seconds is 0".to_string());
        }
        if self.max_workers == 0 {
            error("max_workers is 0: nothing would be deleted".to_string());
        }
        if self.retry.max_retries == 0 {
            error("retry.max_retries is 0: no delete call would be made".to_string());
        }

        if self.retry.max_retries > 10 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "retry.max_retries={} (>10 is unusual)",
                    self.retry.max_retries
                ),
            });
        }

        for &kind in ResourceKind::all() {
            let allow = self.allow.for_kind(kind);
            if allow.is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "allow.{kind} is empty: a purge would delete every {}",
                        kind.singular()
                    ),
                });
            }

            let mut seen = HashSet::new();
            for name in &allow.names {
                if !seen.insert(name.as_str()) {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!("allow.{kind}.names lists '{name}' more than once"),
                    });
                }
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn allow(names: &[&str]) -> AllowList {
        AllowList {
            names: names.iter().map(|s| s.to_string()).collect(),
            ids: Vec::new(),
        }
    }

    fn populated() -> Config {
        let mut cfg = Config::new("org-1");
        cfg.allow.users = allow(&["Ian Young"]);
        cfg.allow.persons = allow(&["Parkour"]);
        cfg.allow.plates = allow(&["Fleet van"]);
        cfg
    }

    #[test]
    fn minimal_yaml_gets_defaults() {
        let yaml = "org_id: abc\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.api.base_url, "https://api.verkada.com");
        assert_eq!(cfg.api.timeout_seconds, 5);
        assert_eq!(cfg.auth.api_key_env, "VERKADA_API_KEY");
        assert_eq!(cfg.rate.limit, 500);
        assert_eq!(cfg.rate.window(), Duration::from_secs(60));
        assert_eq!(cfg.retry.max_retries, 10);
        assert_eq!(cfg.max_workers, 16);
        assert!(cfg.allow.users.is_empty());
    }

    #[test]
    fn retry_policy_from_config() {
        let policy = RetryConfig::default().policy();
        assert_eq!(policy.max_retries, 10);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert_eq!(policy.backoff, Duration::from_millis(250));
    }

    #[test]
    fn allow_lists_parse_names_and_ids() {
        let yaml = r#"
org_id: abc
allow:
  persons:
    names: [Parkour]
    ids: ["751e9607-4617-43e1-9e8c-1bd439c116b6"]
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        let persons = cfg.allow.for_kind(ResourceKind::Persons);
        assert_eq!(persons.names, vec!["Parkour"]);
        assert_eq!(persons.ids.len(), 1);
        assert!(cfg.allow.for_kind(ResourceKind::Plates).is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        populated().save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.org_id, "org-1");
        assert_eq!(loaded.allow.users.names, vec!["Ian Young"]);
    }

    #[test]
    fn load_missing_is_config_not_found() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join(CONFIG_FILE)).unwrap_err();
        assert!(matches!(err, PurgeError::ConfigNotFound(_)));
    }

    #[test]
    fn validate_populated_config_no_warnings() {
        assert!(populated().validate().is_empty());
    }

    #[test]
    fn validate_zero_limits_are_errors() {
        let mut cfg = populated();
        cfg.rate.limit = 0;
        cfg.max_workers = 0;
        cfg.retry.max_retries = 0;
        let errors: Vec<_> = cfg
            .validate()
            .into_iter()
            .filter(|w| w.level == WarnLevel::Error)
            .collect();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn validate_empty_org_id() {
        let mut cfg = populated();
        cfg.org_id = "  ".to_string();
        assert!(cfg
            .validate()
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("org_id")));
    }

    #[test]
    fn validate_empty_allow_list_warns() {
        let mut cfg = populated();
        cfg.allow.plates = AllowList::default();
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| {
            w.level == WarnLevel::Warning && w.message.contains("delete every plate")
        }));
    }

    #[test]
    fn validate_duplicate_names_warns() {
        let mut cfg = populated();
        cfg.allow.users = allow(&["Jane Doe", "Jane Doe"]);
        assert!(cfg
            .validate()
            .iter()
            .any(|w| w.message.contains("'Jane Doe' more than once")));
    }

    #[test]
    fn validate_excessive_retries() {
        let mut cfg = populated();
        cfg.retry.max_retries = 25;
        assert!(cfg
            .validate()
            .iter()
            .any(|w| w.message.contains("max_retries=25")));
    }
}
