use crate::types::ResourceKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// PurgeOutcome
// ---------------------------------------------------------------------------

/// Result of one delete task. Failures are values, never errors: a single
/// resource going wrong must not affect its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PurgeOutcome {
    Deleted,
    /// The vendor no longer knows this ID.
    NotFound,
    /// Still throttled after every permitted attempt.
    ThrottledRetryExhausted { attempts: u32 },
    /// Timeout, rejected input, transport failure or unexpected status.
    TransientError { status: Option<u16>, reason: String },
}

impl PurgeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurgeOutcome::Deleted => "deleted",
            PurgeOutcome::NotFound => "not_found",
            PurgeOutcome::ThrottledRetryExhausted { .. } => "throttled_retry_exhausted",
            PurgeOutcome::TransientError { .. } => "transient_error",
        }
    }

    /// Outcomes that leave the org out of line with the allow-list.
    pub fn needs_attention(&self) -> bool {
        matches!(
            self,
            PurgeOutcome::ThrottledRetryExhausted { .. } | PurgeOutcome::TransientError { .. }
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceOutcome {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub outcome: PurgeOutcome,
}

// ---------------------------------------------------------------------------
// PurgeSummary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PurgeSummary {
    pub run_id: Uuid,
    pub kind: ResourceKind,
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<ResourceOutcome>,
    /// Items never attempted because the run was cancelled.
    pub not_attempted: usize,
    pub cancelled: bool,
    #[serde(serialize_with = "as_secs")]
    pub elapsed: Duration,
}

fn as_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl PurgeSummary {
    pub fn empty(kind: ResourceKind) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            kind,
            started_at: Utc::now(),
            outcomes: Vec::new(),
            not_attempted: 0,
            cancelled: false,
            elapsed: Duration::ZERO,
        }
    }

    fn count(&self, pred: impl Fn(&PurgeOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.outcome)).count()
    }

    pub fn deleted(&self) -> usize {
        self.count(|o| matches!(o, PurgeOutcome::Deleted))
    }

    pub fn not_found(&self) -> usize {
        self.count(|o| matches!(o, PurgeOutcome::NotFound))
    }

    pub fn throttled(&self) -> usize {
        self.count(|o| matches!(o, PurgeOutcome::ThrottledRetryExhausted { .. }))
    }

    pub fn transient(&self) -> usize {
        self.count(|o| matches!(o, PurgeOutcome::TransientError { .. }))
    }

    pub fn needs_attention(&self) -> impl Iterator<Item = &ResourceOutcome> {
        self.outcomes.iter().filter(|o| o.outcome.needs_attention())
    }
}
