use crate::types::{Resource, ResourceKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Operator-curated entries that must survive a purge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllowList {
    /// Display names, matched exactly against each record's name field.
    #[serde(default)]
    pub names: Vec<String>,
    /// Vendor IDs protected without name lookup.
    #[serde(default)]
    pub ids: Vec<String>,
}

impl AllowList {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.ids.is_empty()
    }
}

/// Result of mapping an allow-list onto a concrete inventory.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    pub ids: BTreeSet<String>,
    /// Names with no matching record. Logged, never fatal.
    pub unresolved: Vec<String>,
    /// Names matched by more than one record; only the first is protected.
    pub ambiguous: Vec<String>,
}

impl Resolution {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }
}

/// Resolve `allow` against `resources`.
///
/// Each name is matched by linear scan; the first record in vendor order
/// wins. Pure: the same inputs always produce the same resolution.
pub fn resolve(kind: ResourceKind, resources: &[Resource], allow: &AllowList) -> Resolution {
    let mut resolution = Resolution::default();

    for name in &allow.names {
        let mut matches = resources
            .iter()
            .filter(|r| r.display_name.as_deref() == Some(name.as_str()));

        let Some(first) = matches.next() else {
            tracing::warn!("{} {} was not found in the database", kind.singular(), name);
            if !resolution.unresolved.contains(name) {
                resolution.unresolved.push(name.clone());
            }
            continue;
        };

        let others = matches.count();
        if others > 0 {
            tracing::warn!(
                "{} name '{}' matches {} records; keeping only {}",
                kind.singular(),
                name,
                others + 1,
                first.id
            );
            if !resolution.ambiguous.contains(name) {
                resolution.ambiguous.push(name.clone());
            }
        }
        resolution.ids.insert(first.id.clone());
    }

    for id in &allow.ids {
        if !resources.iter().any(|r| &r.id == id) {
            tracing::debug!("allow-listed {} id {} is not present", kind.singular(), id);
        }
        resolution.ids.insert(id.clone());
    }

    resolution
}

/// IDs present remotely but absent from the resolution, in vendor order.
pub fn delete_set(resources: &[Resource], resolution: &Resolution) -> Vec<String> {
    let mut seen = HashSet::new();
    resources
        .iter()
        .filter(|r| !resolution.contains(&r.id))
        .filter(|r| seen.insert(r.id.as_str()))
        .map(|r| r.id.clone())
        .collect()
}
