use crate::error::{PurgeError, Result};
use crate::types::{Resource, ResourceKind};
use serde::Serialize;
use serde_json::Value;

/// Fetches the complete set of remote records for one resource kind.
///
/// Implementations issue a single request; no pagination is modelled.
/// A non-success status must surface as [`PurgeError::Fetch`].
pub trait ResourceLister: Send + Sync {
    fn list(&self, kind: ResourceKind) -> Result<Inventory>;
}

/// Everything the vendor returned for one kind, in vendor order.
#[derive(Debug, Clone, Serialize)]
pub struct Inventory {
    pub kind: ResourceKind,
    pub resources: Vec<Resource>,
    /// Records dropped because they carried no ID.
    pub skipped: usize,
}

impl Inventory {
    /// Zero records is ambiguous between a truly empty org and a degraded
    /// API, so callers must never read it as "delete everything".
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Parse a listing response body of the form `{ "<array_key>": [ {...}, ... ] }`.
pub fn parse_listing(kind: ResourceKind, body: &Value) -> Result<Inventory> {
    let array = body
        .get(kind.array_key())
        .ok_or_else(|| PurgeError::MalformedListing {
            kind,
            reason: format!("missing '{}' key", kind.array_key()),
        })?
        .as_array()
        .ok_or_else(|| PurgeError::MalformedListing {
            kind,
            reason: format!("'{}' is not a list", kind.array_key()),
        })?;

    let mut resources = Vec::with_capacity(array.len());
    let mut skipped = 0;
    for record in array {
        let Some(obj) = record.as_object() else {
            skipped += 1;
            tracing::error!(%kind, "listing contained a non-object record");
            continue;
        };

        let id = obj
            .get(kind.id_field())
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty());
        let display_name = obj
            .get(kind.name_field())
            .and_then(Value::as_str)
            .map(str::to_string);

        let Some(id) = id else {
            skipped += 1;
            tracing::error!(
                "there has been an error with {} {}: no {}",
                kind.singular(),
                display_name.as_deref().unwrap_or(crate::types::NO_NAME),
                kind.id_field()
            );
            continue;
        };

        let extra = obj
            .iter()
            .filter(|(k, _)| *k != kind.id_field() && *k != kind.name_field())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        resources.push(Resource {
            id: id.to_string(),
            display_name,
            extra,
        });
    }

    Ok(Inventory {
        kind,
        resources,
        skipped,
    })
}
