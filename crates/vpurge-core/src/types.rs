use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ResourceKind
// ---------------------------------------------------------------------------

/// The remote entity families a purge can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Users,
    Persons,
    Plates,
}

impl ResourceKind {
    pub fn all() -> &'static [ResourceKind] {
        &[ResourceKind::Users, ResourceKind::Persons, ResourceKind::Plates]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Users => "users",
            ResourceKind::Persons => "persons",
            ResourceKind::Plates => "plates",
        }
    }

    /// Path of the endpoint returning every record of this kind.
    pub fn list_path(self) -> &'static str {
        match self {
            ResourceKind::Users => "/access/v1/access_users",
            ResourceKind::Persons => "/cameras/v1/people/person_of_interest",
            ResourceKind::Plates => "/cameras/v1/analytics/lpr/license_plate_of_interest",
        }
    }

    /// Path of the endpoint deleting a single record of this kind.
    pub fn delete_path(self) -> &'static str {
        match self {
            ResourceKind::Users => "/core/v1/user",
            ResourceKind::Persons => "/cameras/v1/people/person_of_interest",
            ResourceKind::Plates => "/cameras/v1/analytics/lpr/license_plate_of_interest",
        }
    }

    /// JSON key holding the record array in a listing response.
    pub fn array_key(self) -> &'static str {
        match self {
            ResourceKind::Users => "access_members",
            ResourceKind::Persons => "persons_of_interest",
            ResourceKind::Plates => "license_plate_of_interest",
        }
    }

    /// Record field carrying the vendor ID. Also the delete query parameter.
    pub fn id_field(self) -> &'static str {
        match self {
            ResourceKind::Users => "user_id",
            ResourceKind::Persons => "person_id",
            ResourceKind::Plates => "license_plate",
        }
    }

    /// Record field carrying the human-readable name allow-lists refer to.
    pub fn name_field(self) -> &'static str {
        match self {
            ResourceKind::Users => "full_name",
            ResourceKind::Persons => "label",
            ResourceKind::Plates => "description",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            ResourceKind::Users => "user",
            ResourceKind::Persons => "person",
            ResourceKind::Plates => "plate",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = crate::error::PurgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "users" | "user" => Ok(ResourceKind::Users),
            "persons" | "person" | "poi" => Ok(ResourceKind::Persons),
            "plates" | "plate" | "lpoi" => Ok(ResourceKind::Plates),
            _ => Err(crate::error::PurgeError::InvalidKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

pub const NO_NAME: &str = "No name provided";

/// One remote entity as returned by a listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Kind-specific fields (card facility codes, plate numbers, ...).
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Resource {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: Some(display_name.into()),
            extra: serde_json::Map::new(),
        }
    }

    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(NO_NAME)
    }
}

/// Display names keyed by ID, built once per inventory for log lines and
/// plan output. The first record wins when an ID repeats.
#[derive(Debug, Default)]
pub struct NameIndex<'a> {
    names: HashMap<&'a str, &'a str>,
}

impl<'a> NameIndex<'a> {
    pub fn new(resources: &'a [Resource]) -> Self {
        let mut names = HashMap::with_capacity(resources.len());
        for r in resources {
            names.entry(r.id.as_str()).or_insert_with(|| r.label());
        }
        Self { names }
    }

    pub fn get(&self, id: &str) -> &'a str {
        self.names.get(id).copied().unwrap_or(NO_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn kind_roundtrip_via_str() {
        for kind in ResourceKind::all() {
            assert_eq!(ResourceKind::from_str(kind.as_str()).unwrap(), *kind);
        }
    }

    #[test]
    fn kind_aliases() {
        assert_eq!(ResourceKind::from_str("poi").unwrap(), ResourceKind::Persons);
        assert_eq!(ResourceKind::from_str("lpoi").unwrap(), ResourceKind::Plates);
        assert!(ResourceKind::from_str("cameras").is_err());
    }

    #[test]
    fn users_list_and_delete_endpoints_differ() {
        assert_ne!(
            ResourceKind::Users.list_path(),
            ResourceKind::Users.delete_path()
        );
        assert_eq!(
            ResourceKind::Plates.list_path(),
            ResourceKind::Plates.delete_path()
        );
    }

    #[test]
    fn name_index_falls_back() {
        let resources = vec![
            Resource::new("a", "Keep"),
            Resource::new("a", "Shadowed"),
            Resource {
                id: "b".into(),
                display_name: None,
                extra: serde_json::Map::new(),
            },
        ];
        let names = NameIndex::new(&resources);
        assert_eq!(names.get("a"), "Keep");
        assert_eq!(names.get("b"), NO_NAME);
        assert_eq!(names.get("zzz"), NO_NAME);
    }
}
