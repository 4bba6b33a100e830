pub mod client;
pub mod discovery;

#[cfg(test)]
pub mod mock;

use crate::error::Result;
use crate::models::{DeletionState, ResourceType};
use self::discovery::DiscoveredGroup;

/// Capabilities the scanner and reclaimer need from a cluster.
///
/// Production code talks to the real API server through
/// [`client::KubeCluster`]; tests substitute [`mock::MockCluster`].
#[async_trait::async_trait]
pub trait ClusterAccess: Send + Sync {
    /// Cheap read probe (lists nodes) to confirm the credentials work at all.
    async fn verify_access(&self) -> Result<()>;

    /// Names of every namespace in the cluster.
    async fn list_namespaces(&self) -> Result<Vec<String>>;

    /// Raw API discovery output: every served group-version with its
    /// resources. Filtering happens in [`discovery`].
    async fn discover(&self) -> Result<Vec<DiscoveredGroup>>;

    /// Names of all objects of `resource_type` in `namespace`.
    async fn list_objects(
        &self,
        namespace: &str,
        resource_type: &ResourceType,
    ) -> Result<Vec<String>>;

    /// Fetches one object and reads its deletion timestamp.
    async fn deletion_state(
        &self,
        namespace: &str,
        resource_type: &ResourceType,
        name: &str,
    ) -> Result<DeletionState>;

    /// Clears the object's finalizers and deletes it. A 404 on the delete is
    /// success: removing the finalizers can let garbage collection finish
    /// before our own delete lands.
    async fn force_delete(
        &self,
        namespace: &str,
        resource_type: &ResourceType,
        name: &str,
    ) -> Result<()>;
}
