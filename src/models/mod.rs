use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use kube::api::ApiResource;
use serde::Serialize;

/// A namespaced API resource kind discovered from the cluster, identified by
/// its group/version/resource triple.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceType {
    pub group: String,
    pub version: String,
    /// Plural resource name, e.g. `deployments`.
    pub resource: String,
    /// Kind as reported by discovery; needed to address the dynamic API but
    /// not part of the identity.
    #[serde(skip)]
    pub kind: String,
}

impl ResourceType {
    pub fn is_core(&self) -> bool {
        self.group.is_empty()
    }

    /// The `group/version` string as it appears in discovery, `v1` for core.
    pub fn group_version(&self) -> String {
        if self.is_core() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn api_resource(&self) -> ApiResource {
        ApiResource {
            group: self.group.clone(),
            version: self.version.clone(),
            api_version: self.group_version(),
            kind: self.kind.clone(),
            plural: self.resource.clone(),
        }
    }
}

// Identity is the triple only; `kind` is derived data.
impl PartialEq for ResourceType {
    fn eq(&self, other: &Self) -> bool {
        self.group == other.group
            && self.version == other.version
            && self.resource == other.resource
    }
}

impl Eq for ResourceType {}

impl Hash for ResourceType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.group.hash(state);
        self.version.hash(state);
        self.resource.hash(state);
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group_version(), self.resource)
    }
}

/// Identifies a single object within one scan cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub namespace: String,
    pub resource_type: ResourceType,
    pub name: String,
}

/// Whether an object is marked for deletion, observed at fetch time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeletionState {
    pub is_deleting: bool,
    pub deletion_timestamp: Option<DateTime<Utc>>,
}

/// An object stuck in a terminating state, as exposed on `/stuck-objects`.
///
/// `deletion_timestamp` is always the timestamp carried by the live object;
/// entries are only created for objects that actually have one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StuckObject {
    pub namespace: String,
    pub resource: String,
    pub name: String,
    // Exposed as `deleteTimestamp`, the key consumers of the JSON endpoint
    // already rely on.
    #[serde(rename = "deleteTimestamp")]
    pub deletion_timestamp: DateTime<Utc>,
    pub group_version_resource: ResourceType,
}

impl StuckObject {
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            namespace: self.namespace.clone(),
            resource_type: self.group_version_resource.clone(),
            name: self.name.clone(),
        }
    }
}

/// Outcome of one full scan cycle, used for logging and metrics only.
#[derive(Debug, Clone, Copy)]
pub struct ScanResult {
    pub success: bool,
    pub namespace_count: usize,
    pub total_object_count: usize,
}
