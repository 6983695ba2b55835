use super::load_config;
use crate::output::print_json;
use clap::Subcommand;
use std::path::Path;
use vpurge_core::config::WarnLevel;
use vpurge_core::types::ResourceKind;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Validate the config for common mistakes
    Validate,

    /// Show the effective config, defaults included
    Show,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(path: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Validate => validate(path, json),
        ConfigSubcommand::Show => show(path, json),
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(path: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(path)?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(path: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(path)?;

    if json {
        return print_json(&config);
    }

    println!("Config:       {}", path.display());
    println!("Org:          {}", config.org_id);
    println!("API:          {}", config.api.base_url);
    println!("Credential:   ${}", config.auth.api_key_env);
    println!(
        "Rate budget:  {} calls / {}s",
        config.rate.limit, config.rate.window_seconds
    );
    println!(
        "Retries:      {} (delay {}ms + {}ms per retry)",
        config.retry.max_retries, config.retry.base_delay_ms, config.retry.backoff_ms
    );
    println!("Workers:      {}", config.max_workers);
    println!("Allow-lists:");
    for &kind in ResourceKind::all() {
        let allow = config.allow.for_kind(kind);
        println!(
            "  {:<8} {} names, {} ids",
            kind.as_str(),
            allow.names.len(),
            allow.ids.len()
        );
    }
    Ok(())
}
