pub mod config;
pub mod init;
pub mod list;
pub mod plan;
pub mod purge;

use anyhow::Context;
use std::path::Path;
use std::str::FromStr;
use vpurge_core::client::CommandClient;
use vpurge_core::config::{Config, WarnLevel};
use vpurge_core::types::ResourceKind;

pub(crate) fn load_config(path: &Path) -> anyhow::Result<Config> {
    Config::load(path).with_context(|| format!("failed to load config {}", path.display()))
}

/// Load the config and refuse to go further if validation reports errors.
/// Warnings are logged and do not block.
pub(crate) fn load_valid_config(path: &Path) -> anyhow::Result<Config> {
    let config = load_config(path)?;
    let mut errors = Vec::new();
    for w in config.validate() {
        match w.level {
            WarnLevel::Error => errors.push(w.message),
            WarnLevel::Warning => tracing::warn!("{}", w.message),
        }
    }
    if !errors.is_empty() {
        anyhow::bail!(
            "invalid config {}: {}",
            path.display(),
            errors.join("; ")
        );
    }
    Ok(config)
}

pub(crate) fn connect(config: &Config) -> anyhow::Result<CommandClient> {
    let session = crate::credentials::session_from_env(config)?;
    CommandClient::from_config(config, &session).context("failed to build HTTP client")
}

/// `all` expands to every kind; anything else must name exactly one.
pub(crate) fn parse_kinds(arg: &str) -> anyhow::Result<Vec<ResourceKind>> {
    if arg == "all" {
        return Ok(ResourceKind::all().to_vec());
    }
    Ok(vec![ResourceKind::from_str(arg)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_is_refused() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vpurge.yaml");
        let mut config = Config::new("org-1");
        config.rate.window_seconds = 0;
        config.max_workers = 0;
        config.save(&path).unwrap();

        let err = load_valid_config(&path).unwrap_err().to_string();
        assert!(err.contains("rate.window_seconds is 0"));
        assert!(err.contains("max_workers is 0"));

        config.rate.window_seconds = 60;
        config.max_workers = 4;
        config.save(&path).unwrap();
        assert_eq!(load_valid_config(&path).unwrap().max_workers, 4);
    }

    #[test]
    fn parse_all_and_single() {
        assert_eq!(parse_kinds("all").unwrap().len(), 3);
        assert_eq!(parse_kinds("plates").unwrap(), vec![ResourceKind::Plates]);
        assert!(parse_kinds("doors").is_err());
    }
}
