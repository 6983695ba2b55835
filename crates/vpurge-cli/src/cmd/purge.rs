use super::{connect, load_valid_config, parse_kinds};
use crate::gate::InteractiveGate;
use crate::output::{print_json, print_table};
use std::path::Path;
use vpurge_core::cancel::CancelToken;
use vpurge_core::engine::{Engine, RunReport};
use vpurge_core::gate::{AutoApprove, ConfirmationGate};
use vpurge_core::PurgeError;

pub fn run(
    path: &Path,
    kind: &str,
    yes: bool,
    cancel: &CancelToken,
    json: bool,
) -> anyhow::Result<()> {
    let kinds = parse_kinds(kind)?;
    let config = load_valid_config(path)?;
    let client = connect(&config)?;
    // One engine for every kind so they all draw from the same rate budget.
    let engine = Engine::from_config(&client, &config);

    let interactive;
    let gate: &dyn ConfirmationGate = if yes {
        &AutoApprove
    } else {
        interactive = InteractiveGate::stdio().with_cancel(cancel.clone());
        &interactive
    };

    let mut reports = Vec::new();
    let mut failures = Vec::new();
    for kind in kinds {
        if cancel.is_cancelled() {
            break;
        }
        match engine.run(kind, gate, cancel) {
            Ok(report) => reports.push(report),
            Err(PurgeError::Cancelled) => break,
            Err(e) => {
                tracing::error!("{kind}: {e}");
                failures.push(format!("{kind}: {e}"));
            }
        }
    }

    if json {
        print_json(&serde_json::json!({
            "reports": reports,
            "failures": failures,
            "cancelled": cancel.is_cancelled(),
        }))?;
    } else {
        print_reports(&reports);
    }

    if !failures.is_empty() {
        anyhow::bail!("purge aborted for {}", failures.join("; "));
    }
    Ok(())
}

fn print_reports(reports: &[RunReport]) {
    if reports.is_empty() {
        return;
    }

    let rows = reports
        .iter()
        .map(|report| {
            let kind = report.kind().to_string();
            match report {
                RunReport::EmptyInventory { .. } => row(kind, "empty listing", None),
                RunReport::AlreadyPurged { .. } => row(kind, "already purged", None),
                RunReport::Declined { .. } => row(kind, "declined", None),
                RunReport::Completed(summary) => {
                    let status = if summary.cancelled {
                        "cancelled"
                    } else {
                        "completed"
                    };
                    row(kind, status, Some(summary))
                }
            }
        })
        .collect();
    print_table(
        &[
            "KIND",
            "STATUS",
            "DELETED",
            "NOT_FOUND",
            "THROTTLED",
            "ERRORS",
            "SKIPPED",
            "ELAPSED",
        ],
        rows,
    );

    for report in reports {
        if let RunReport::Completed(summary) = report {
            for entry in summary.needs_attention() {
                println!(
                    "attention: {} {} ({}): {}",
                    summary.kind.singular(),
                    entry.name,
                    entry.id,
                    entry.outcome.as_str()
                );
            }
        }
    }
}

fn row(
    kind: String,
    status: &str,
    summary: Option<&vpurge_core::outcome::PurgeSummary>,
) -> Vec<String> {
    let Some(s) = summary else {
        let mut cells = vec![kind, status.to_string()];
        cells.extend(std::iter::repeat("-".to_string()).take(6));
        return cells;
    };
    vec![
        kind,
        status.to_string(),
        s.deleted().to_string(),
        s.not_found().to_string(),
        s.throttled().to_string(),
        s.transient().to_string(),
        s.not_attempted.to_string(),
        format!("{:.2}s", s.elapsed.as_secs_f64()),
    ]
}
