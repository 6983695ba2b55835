use crate::cancel::CancelToken;
use crate::error::Result;
use crate::outcome::{PurgeOutcome, PurgeSummary, ResourceOutcome};
use crate::rate::RateBudget;
use crate::types::{NameIndex, Resource, ResourceKind};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Issues a single vendor DELETE and reports the HTTP status code.
///
/// `Err` means no status was obtained at all (connection reset, client
/// timeout); the executor records it as a transient failure.
pub trait DeleteTransport: Send + Sync {
    fn delete(&self, kind: ResourceKind, id: &str) -> Result<u16>;
}

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// Linear backoff applied to throttled (429) deletes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total HTTP calls one delete may make.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            base_delay: Duration::from_millis(250),
            backoff: Duration::from_millis(250),
        }
    }
}

// ---------------------------------------------------------------------------
// PurgeExecutor
// ---------------------------------------------------------------------------

/// Deletes a computed set of IDs on a bounded pool of worker threads.
///
/// Every HTTP call, retries included, first draws from the shared
/// [`RateBudget`]. Failures are recorded per resource and never stop the
/// batch.
#[derive(Debug)]
pub struct PurgeExecutor {
    budget: Arc<RateBudget>,
    policy: RetryPolicy,
    max_workers: usize,
}

impl PurgeExecutor {
    pub fn new(budget: Arc<RateBudget>, policy: RetryPolicy, max_workers: usize) -> Self {
        Self {
            budget,
            policy,
            max_workers: max_workers.max(1),
        }
    }

    /// Delete every ID in `delete`, joining all workers before returning.
    ///
    /// `resources` is only consulted for names in log lines.
    pub fn execute(
        &self,
        transport: &dyn DeleteTransport,
        kind: ResourceKind,
        delete: &[String],
        resources: &[Resource],
        cancel: &CancelToken,
    ) -> PurgeSummary {
        let mut summary = PurgeSummary::empty(kind);
        if delete.is_empty() {
            tracing::warn!("{kind}: there's nothing here");
            return summary;
        }

        tracing::info!(run_id = %summary.run_id, "{kind}: purging {} ...", delete.len());
        let started = Instant::now();
        let queue = Mutex::new(delete.iter());
        let names = NameIndex::new(resources);
        let workers = self.max_workers.min(delete.len());

        let results: Vec<(Vec<ResourceOutcome>, usize)> = thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|_| s.spawn(|| self.work(transport, kind, &queue, &names, cancel)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });

        for (outcomes, skipped) in results {
            summary.outcomes.extend(outcomes);
            summary.not_attempted += skipped;
        }
        summary.not_attempted += queue
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        summary.cancelled = cancel.is_cancelled();
        summary.elapsed = started.elapsed();

        tracing::info!("{kind}: purge complete");
        tracing::info!("{kind}: time to complete: {:.2}s", summary.elapsed.as_secs_f64());
        summary
    }

    fn work<'a>(
        &self,
        transport: &dyn DeleteTransport,
        kind: ResourceKind,
        queue: &Mutex<std::slice::Iter<'a, String>>,
        names: &NameIndex<'_>,
        cancel: &CancelToken,
    ) -> (Vec<ResourceOutcome>, usize) {
        let mut outcomes = Vec::new();
        let mut skipped = 0;
        while !cancel.is_cancelled() {
            let next = queue.lock().unwrap_or_else(PoisonError::into_inner).next();
            let Some(id) = next else { break };
            let name = names.get(id);
            match self.delete_one(transport, kind, id, name, cancel) {
                Some(outcome) => outcomes.push(ResourceOutcome {
                    id: id.clone(),
                    name: name.to_string(),
                    outcome,
                }),
                None => skipped += 1,
            }
        }
        (outcomes, skipped)
    }

    /// Run one delete to completion. `None` means cancellation arrived before
    /// any call was made.
    fn delete_one(
        &self,
        transport: &dyn DeleteTransport,
        kind: ResourceKind,
        id: &str,
        name: &str,
        cancel: &CancelToken,
    ) -> Option<PurgeOutcome> {
        let attempts = self.policy.max_retries.max(1);
        let mut delay = self.policy.base_delay;
        tracing::info!("running for {}: {}", kind.singular(), name);

        for attempt in 1..=attempts {
            if self.budget.acquire(cancel).is_err() {
                if attempt == 1 {
                    return None;
                }
                return Some(cancelled_while_throttled());
            }

            let status = match transport.delete(kind, id) {
                Ok(status) => status,
                Err(e) => {
                    tracing::error!("{kind}: {name} delete failed: {e}");
                    return Some(PurgeOutcome::TransientError {
                        status: None,
                        reason: e.to_string(),
                    });
                }
            };

            if status != 429 {
                return Some(classify(kind, name, status));
            }
            if attempt == attempts {
                break;
            }

            tracing::info!("{name} response: 429. retrying in {:.2?}", delay);
            if self.budget.clock().sleep(delay, cancel) {
                return Some(cancelled_while_throttled());
            }
            delay += self.policy.backoff;
        }

        tracing::error!(
            "{kind}: {name} still throttled after {attempts} attempts; \
             hit the API request rate limit"
        );
        Some(PurgeOutcome::ThrottledRetryExhausted { attempts })
    }
}

fn cancelled_while_throttled() -> PurgeOutcome {
    PurgeOutcome::TransientError {
        status: Some(429),
        reason: "cancelled while throttled".to_string(),
    }
}

fn classify(kind: ResourceKind, name: &str, status: u16) -> PurgeOutcome {
    match status {
        200 => PurgeOutcome::Deleted,
        404 => {
            tracing::info!("{kind}: {name} was already gone");
            PurgeOutcome::NotFound
        }
        504 => {
            tracing::warn!("{kind}: {name} timed out");
            PurgeOutcome::TransientError {
                status: Some(504),
                reason: "timed out".to_string(),
            }
        }
        // Retrying a rejected request cannot succeed.
        400 => {
            tracing::warn!("{kind}: contact support: endpoint failure for {name}");
            PurgeOutcome::TransientError {
                status: Some(400),
                reason: "endpoint rejected the request".to_string(),
            }
        }
        other => {
            tracing::error!("{kind}: an error has occurred for {name}. status code {other}");
            PurgeOutcome::TransientError {
                status: Some(other),
                reason: format!("unexpected status {other}"),
            }
        }
    }
}
