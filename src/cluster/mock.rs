//! In-memory [`ClusterAccess`] used by scanner and reclaimer tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use kube::core::ErrorResponse;

use super::ClusterAccess;
use super::discovery::DiscoveredGroup;
use crate::error::{AppError, Result};
use crate::models::{DeletionState, ResourceType};

pub fn not_found() -> AppError {
    AppError::Kube(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: "the server could not find the requested resource".to_string(),
        reason: "NotFound".to_string(),
        code: 404,
    }))
}

pub fn server_error() -> AppError {
    AppError::Kube(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: "internal error".to_string(),
        reason: "InternalError".to_string(),
        code: 500,
    }))
}

#[derive(Default)]
pub struct MockCluster {
    pub namespaces: Vec<String>,
    pub groups: Vec<DiscoveredGroup>,
    /// (namespace, plural resource name) -> object names.
    pub objects: HashMap<(String, String), Vec<String>>,
    /// (namespace, plural, object name) -> deletion timestamp.
    pub deleting: HashMap<(String, String, String), DateTime<Utc>>,
    /// Plural resource names whose list call 404s (kind not served).
    pub unserved: HashSet<String>,
    /// Plural resource names whose list call fails with a server error.
    pub fail_list: HashSet<String>,
    /// Object names whose get fails.
    pub fail_get: HashSet<String>,
    /// Object names whose force delete fails.
    pub fail_delete: HashSet<String>,
    pub fail_access: bool,
    /// Every force_delete call, as (namespace, name).
    pub deleted: Mutex<Vec<(String, String)>>,
}

impl MockCluster {
    pub fn with_objects(mut self, ns: &str, resource: &str, names: &[&str]) -> Self {
        self.objects.insert(
            (ns.to_string(), resource.to_string()),
            names.iter().map(|n| n.to_string()).collect(),
        );
        self
    }

    pub fn with_deleting(mut self, ns: &str, resource: &str, name: &str, ts: DateTime<Utc>) -> Self {
        self.deleting
            .insert((ns.to_string(), resource.to_string(), name.to_string()), ts);
        self
    }

    pub fn deleted_names(&self) -> Vec<String> {
        self.deleted
            .lock()
            .unwrap()
            .iter()
            .map(|(_, name)| name.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl ClusterAccess for MockCluster {
    async fn verify_access(&self) -> Result<()> {
        if self.fail_access {
            return Err(server_error());
        }
        Ok(())
    }

    async fn list_namespaces(&self) -> Result<Vec<String>> {
        Ok(self.namespaces.clone())
    }

    async fn discover(&self) -> Result<Vec<DiscoveredGroup>> {
        Ok(self.groups.clone())
    }

    async fn list_objects(
        &self,
        namespace: &str,
        resource_type: &ResourceType,
    ) -> Result<Vec<String>> {
        if self.unserved.contains(&resource_type.resource) {
            return Err(not_found());
        }
        if self.fail_list.contains(&resource_type.resource) {
            return Err(server_error());
        }
        Ok(self
            .objects
            .get(&(namespace.to_string(), resource_type.resource.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn deletion_state(
        &self,
        namespace: &str,
        resource_type: &ResourceType,
        name: &str,
    ) -> Result<DeletionState> {
        if self.fail_get.contains(name) {
            return Err(server_error());
        }
        let key = (
            namespace.to_string(),
            resource_type.resource.clone(),
            name.to_string(),
        );
        Ok(match self.deleting.get(&key) {
            Some(ts) => DeletionState {
                is_deleting: true,
                deletion_timestamp: Some(*ts),
            },
            None => DeletionState {
                is_deleting: false,
                deletion_timestamp: None,
            },
        })
    }

    async fn force_delete(
        &self,
        namespace: &str,
        _resource_type: &ResourceType,
        name: &str,
    ) -> Result<()> {
        if self.fail_delete.contains(name) {
            return Err(server_error());
        }
        self.deleted
            .lock()
            .unwrap()
            .push((namespace.to_string(), name.to_string()));
        Ok(())
    }
}
