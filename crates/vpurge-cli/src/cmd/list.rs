use super::{connect, load_valid_config};
use crate::output::{print_json, print_table};
use anyhow::Context;
use std::path::Path;
use std::str::FromStr;
use vpurge_core::lister::ResourceLister;
use vpurge_core::types::ResourceKind;

pub fn run(path: &Path, kind: &str, json: bool) -> anyhow::Result<()> {
    let kind = ResourceKind::from_str(kind)?;
    let config = load_valid_config(path)?;
    let client = connect(&config)?;
    let inventory = client
        .list(kind)
        .with_context(|| format!("failed to list {kind}"))?;

    if json {
        return print_json(&inventory);
    }

    if inventory.is_empty() {
        println!("No {kind} found.");
        return Ok(());
    }

    let rows = inventory
        .resources
        .iter()
        .map(|r| vec![r.id.clone(), r.label().to_string()])
        .collect();
    print_table(&["ID", "NAME"], rows);
    if inventory.skipped > 0 {
        println!("({} records without an ID were skipped)", inventory.skipped);
    }
    Ok(())
}
