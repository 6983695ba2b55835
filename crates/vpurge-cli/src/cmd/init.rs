use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use vpurge_core::config::Config;
use vpurge_core::io::write_if_missing;

pub fn run(path: &Path, org_id: Option<String>, force: bool, json: bool) -> anyhow::Result<()> {
    let config = Config::new(org_id.unwrap_or_default());

    let written = if force {
        config.save(path).map(|_| true)
    } else {
        let data = serde_yaml::to_string(&config)?;
        write_if_missing(path, data.as_bytes())
    }
    .with_context(|| format!("failed to write {}", path.display()))?;

    if json {
        print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "written": written,
        }))?;
    } else if written {
        println!("Created {}", path.display());
        println!("Next: add allow-list names, then run 'vpurge config validate'");
    } else {
        println!("{} already exists (use --force to overwrite)", path.display());
    }
    Ok(())
}
