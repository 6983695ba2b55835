use super::{connect, load_valid_config, parse_kinds};
use crate::output::{print_json, print_table};
use anyhow::Context;
use std::path::Path;
use vpurge_core::engine::{Engine, PurgePlan};

pub fn run(path: &Path, kind: &str, json: bool) -> anyhow::Result<()> {
    let kinds = parse_kinds(kind)?;
    let config = load_valid_config(path)?;
    let client = connect(&config)?;
    let engine = Engine::from_config(&client, &config);

    let mut plans = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let plan = engine
            .plan(kind)
            .with_context(|| format!("failed to plan {kind}"))?;
        plans.push(plan);
    }

    if json {
        return print_json(&plans);
    }

    for plan in &plans {
        print_plan(plan);
    }
    Ok(())
}

fn print_plan(plan: &PurgePlan) {
    let kind = plan.kind;
    println!(
        "{kind}: {} found, {} kept, {} to delete",
        plan.inventory.resources.len(),
        plan.resolution.ids.len(),
        plan.delete.len()
    );

    if plan.inventory.is_empty() {
        println!("  Listing was empty; a purge would not run.");
        println!();
        return;
    }

    let mut rows: Vec<Vec<String>> = plan
        .inventory
        .resources
        .iter()
        .filter(|r| plan.resolution.contains(&r.id))
        .map(|r| vec!["keep".to_string(), r.id.clone(), r.label().to_string()])
        .collect();
    let names = plan.names();
    rows.extend(
        plan.delete
            .iter()
            .map(|id| vec!["delete".to_string(), id.clone(), names.get(id).to_string()]),
    );
    print_table(&["ACTION", "ID", "NAME"], rows);

    for name in &plan.resolution.unresolved {
        println!("warning: allow-listed name '{name}' was not found");
    }
    for name in &plan.resolution.ambiguous {
        println!("warning: '{name}' matches several records; only the first is kept");
    }
    println!();
}
