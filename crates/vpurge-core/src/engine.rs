//! The purge pipeline: list, resolve, confirm, execute.
//!
//! Each phase completes before the next starts. A failed listing aborts the
//! run before anything is deleted.

use crate::cancel::CancelToken;
use crate::config::{AllowConfig, Config};
use crate::error::{PurgeError, Result};
use crate::executor::{DeleteTransport, PurgeExecutor};
use crate::gate::ConfirmationGate;
use crate::lister::{Inventory, ResourceLister};
use crate::outcome::PurgeSummary;
use crate::rate::RateBudget;
use crate::resolver::{delete_set, resolve, AllowList, Resolution};
use crate::types::{NameIndex, ResourceKind};
use serde::Serialize;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// PurgePlan
// ---------------------------------------------------------------------------

/// Everything known about a purge before the first delete is issued.
#[derive(Debug, Clone, Serialize)]
pub struct PurgePlan {
    pub kind: ResourceKind,
    /// The allow-list as configured by the operator.
    pub allow: AllowList,
    pub inventory: Inventory,
    pub resolution: Resolution,
    /// IDs to delete, in vendor order.
    pub delete: Vec<String>,
}

impl PurgePlan {
    pub fn names(&self) -> NameIndex<'_> {
        NameIndex::new(&self.inventory.resources)
    }

    pub fn keep_names(&self) -> Vec<&str> {
        let names = self.names();
        self.resolution.ids.iter().map(|id| names.get(id)).collect()
    }

    pub fn delete_names(&self) -> Vec<&str> {
        let names = self.names();
        self.delete.iter().map(|id| names.get(id)).collect()
    }
}

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunReport {
    /// The listing parsed but held no records; nothing is deleted.
    EmptyInventory { kind: ResourceKind },
    /// Every remote record is allow-listed.
    AlreadyPurged { kind: ResourceKind },
    Declined { kind: ResourceKind },
    Completed(PurgeSummary),
}

impl RunReport {
    pub fn kind(&self) -> ResourceKind {
        match self {
            RunReport::EmptyInventory { kind }
            | RunReport::AlreadyPurged { kind }
            | RunReport::Declined { kind } => *kind,
            RunReport::Completed(summary) => summary.kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Engine<'a> {
    lister: &'a dyn ResourceLister,
    transport: &'a dyn DeleteTransport,
    executor: PurgeExecutor,
    allow: AllowConfig,
}

impl<'a> Engine<'a> {
    pub fn new(
        lister: &'a dyn ResourceLister,
        transport: &'a dyn DeleteTransport,
        executor: PurgeExecutor,
        allow: AllowConfig,
    ) -> Self {
        Self {
            lister,
            transport,
            executor,
            allow,
        }
    }

    /// Build an engine whose kinds all share one rate budget sized from config.
    pub fn from_config<C>(client: &'a C, config: &Config) -> Self
    where
        C: ResourceLister + DeleteTransport,
    {
        let budget = Arc::new(RateBudget::new(config.rate.limit, config.rate.window()));
        let executor = PurgeExecutor::new(budget, config.retry.policy(), config.max_workers);
        Self::new(client, client, executor, config.allow.clone())
    }

    /// List and resolve without touching anything.
    pub fn plan(&self, kind: ResourceKind) -> Result<PurgePlan> {
        tracing::info!("retrieving {kind}");
        let inventory = self.lister.list(kind)?;
        tracing::info!("{} {kind} retrieved", inventory.resources.len());

        let allow = self.allow.for_kind(kind).clone();
        tracing::info!("searching for safe {kind}");
        let resolution = resolve(kind, &inventory.resources, &allow);
        let delete = delete_set(&inventory.resources, &resolution);
        tracing::info!(
            "{kind}: {} safe, {} marked for deletion",
            resolution.ids.len(),
            delete.len()
        );

        Ok(PurgePlan {
            kind,
            allow,
            inventory,
            resolution,
            delete,
        })
    }

    pub fn run(
        &self,
        kind: ResourceKind,
        gate: &dyn ConfirmationGate,
        cancel: &CancelToken,
    ) -> Result<RunReport> {
        let plan = self.plan(kind)?;

        if plan.inventory.is_empty() {
            tracing::warn!("no {kind} were found; refusing to treat an empty listing as purgeable");
            return Ok(RunReport::EmptyInventory { kind });
        }
        if plan.delete.is_empty() {
            tracing::info!(
                "the organization has already been purged. there are no more {kind} to delete"
            );
            return Ok(RunReport::AlreadyPurged { kind });
        }
        if !gate.confirm(&plan) {
            tracing::info!("{kind}: purge declined");
            return Ok(RunReport::Declined { kind });
        }
        if cancel.is_cancelled() {
            return Err(PurgeError::Cancelled);
        }

        let summary = self.executor.execute(
            self.transport,
            kind,
            &plan.delete,
            &plan.inventory.resources,
            cancel,
        );
        for entry in summary.needs_attention() {
            tracing::error!(
                "{kind}: {} ({}) needs manual follow-up: {}",
                entry.name,
                entry.id,
                entry.outcome.as_str()
            );
        }
        Ok(RunReport::Completed(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RetryPolicy;
    use crate::gate::{AutoApprove, Decline};
    use crate::types::Resource;
    use std::sync::Mutex;
    use std::time::Duration;

    struct FakeClient {
        listing: Option<Vec<Resource>>,
        deleted: Mutex<Vec<String>>,
    }

    impl FakeClient {
        fn with(resources: Vec<Resource>) -> Self {
            Self {
                listing: Some(resources),
                deleted: Mutex::new(Vec::new()),
            }
        }

        fn unavailable() -> Self {
            Self {
                listing: None,
                deleted: Mutex::new(Vec::new()),
            }
        }

        fn deleted(&self) -> Vec<String> {
            self.deleted.lock().unwrap().clone()
        }
    }

    impl ResourceLister for FakeClient {
        fn list(&self, kind: ResourceKind) -> Result<Inventory> {
            match &self.listing {
                Some(resources) => Ok(Inventory {
                    kind,
                    resources: resources.clone(),
                    skipped: 0,
                }),
                None => Err(PurgeError::Fetch { kind, status: 503 }),
            }
        }
    }

    impl DeleteTransport for FakeClient {
        fn delete(&self, _kind: ResourceKind, id: &str) -> Result<u16> {
            self.deleted.lock().unwrap().push(id.to_string());
            Ok(200)
        }
    }

    fn engine<'a>(client: &'a FakeClient, keep: &[&str]) -> Engine<'a> {
        let budget = Arc::new(RateBudget::new(500, Duration::from_secs(60)));
        let executor = PurgeExecutor::new(budget, RetryPolicy::default(), 4);
        let mut allow = AllowConfig::default();
        allow.users.names = keep.iter().map(|s| s.to_string()).collect();
        Engine::new(client, client, executor, allow)
    }

    #[test]
    fn keep_drop_scenario_deletes_only_drop() {
        let client = FakeClient::with(vec![Resource::new("a", "Keep"), Resource::new("b", "Drop")]);
        let report = engine(&client, &["Keep"])
            .run(ResourceKind::Users, &AutoApprove, &CancelToken::new())
            .unwrap();
        assert_eq!(client.deleted(), vec!["b"]);
        let RunReport::Completed(summary) = report else {
            panic!("expected Completed")
        };
        assert_eq!(summary.deleted(), 1);
    }

    #[test]
    fn fetch_error_aborts_before_any_delete() {
        let client = FakeClient::unavailable();
        let err = engine(&client, &["Keep"])
            .run(ResourceKind::Users, &AutoApprove, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, PurgeError::Fetch { status: 503, .. }));
        assert!(client.deleted().is_empty());
    }

    #[test]
    fn empty_inventory_is_never_purged() {
        let client = FakeClient::with(Vec::new());
        let report = engine(&client, &[])
            .run(ResourceKind::Users, &AutoApprove, &CancelToken::new())
            .unwrap();
        assert!(matches!(report, RunReport::EmptyInventory { .. }));
    }

    #[test]
    fn fully_allow_listed_org_is_already_purged() {
        let client = FakeClient::with(vec![Resource::new("a", "Keep")]);
        let report = engine(&client, &["Keep"])
            .run(ResourceKind::Users, &AutoApprove, &CancelToken::new())
            .unwrap();
        assert!(matches!(report, RunReport::AlreadyPurged { .. }));
        assert!(client.deleted().is_empty());
    }

    #[test]
    fn declined_gate_deletes_nothing() {
        let client = FakeClient::with(vec![Resource::new("a", "Keep"), Resource::new("b", "Drop")]);
        let report = engine(&client, &["Keep"])
            .run(ResourceKind::Users, &Decline, &CancelToken::new())
            .unwrap();
        assert!(matches!(report, RunReport::Declined { .. }));
        assert!(client.deleted().is_empty());
    }

    #[test]
    fn gate_sees_the_computed_plan() {
        let client = FakeClient::with(vec![
            Resource::new("a", "Keep"),
            Resource::new("b", "Drop"),
            Resource::new("c", "Also drop"),
        ]);
        let seen = Mutex::new(None);
        let gate = |plan: &PurgePlan| {
            *seen.lock().unwrap() = Some((plan.keep_names().join(","), plan.delete_names().join(",")));
            false
        };
        engine(&client, &["Keep", "Ghost"])
            .run(ResourceKind::Users, &gate, &CancelToken::new())
            .unwrap();
        let (keep, delete) = seen.into_inner().unwrap().unwrap();
        assert_eq!(keep, "Keep");
        assert_eq!(delete, "Drop,Also drop");
    }

    #[test]
    fn plan_reports_unresolved_names() {
        let client = FakeClient::with(vec![Resource::new("a", "Keep")]);
        let plan = engine(&client, &["Keep", "Ghost"])
            .plan(ResourceKind::Users)
            .unwrap();
        assert_eq!(plan.resolution.unresolved, vec!["Ghost"]);
        assert!(plan.delete.is_empty());
    }

    #[test]
    fn cancelled_before_execute_is_an_error() {
        let client = FakeClient::with(vec![Resource::new("b", "Drop")]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = engine(&client, &[])
            .run(ResourceKind::Users, &AutoApprove, &cancel)
            .unwrap_err();
        assert!(matches!(err, PurgeError::Cancelled));
        assert!(client.deleted().is_empty());
    }
}
