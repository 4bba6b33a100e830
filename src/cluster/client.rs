use k8s_openapi::api::core::v1::{Namespace, Node};
use kube::api::{Api, DeleteParams, DynamicObject, ListParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::discovery::{Discovery, Scope};
use kube::{Client, Config, ResourceExt};

use super::discovery::{DiscoveredGroup, DiscoveredResource};
use super::ClusterAccess;
use crate::error::{AppError, Result};
use crate::models::{DeletionState, ResourceType};

/// Cluster access backed by a real `kube::Client`.
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    /// Connects using the given kubeconfig path, or infers the configuration
    /// (in-cluster service account or the default kubeconfig) when the path
    /// is empty.
    pub async fn connect(kubeconfig: &str) -> Result<Self> {
        let config = if kubeconfig.is_empty() {
            tracing::debug!("inferring cluster configuration");
            Config::infer()
                .await
                .map_err(|e| AppError::Config(format!("failed to infer cluster config: {e}")))?
        } else {
            tracing::debug!(path = kubeconfig, "loading kubeconfig");
            let kc = Kubeconfig::read_from(kubeconfig)
                .map_err(|e| AppError::Config(format!("failed to read kubeconfig: {e}")))?;
            Config::from_custom_kubeconfig(kc, &KubeConfigOptions::default())
                .await
                .map_err(|e| AppError::Config(format!("failed to load kubeconfig: {e}")))?
        };
        let client = Client::try_from(config)?;
        Ok(Self { client })
    }

    fn dynamic_api(&self, namespace: &str, resource_type: &ResourceType) -> Api<DynamicObject> {
        Api::namespaced_with(
            self.client.clone(),
            namespace,
            &resource_type.api_resource(),
        )
    }
}

#[async_trait::async_trait]
impl ClusterAccess for KubeCluster {
    async fn verify_access(&self) -> Result<()> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        nodes.list(&ListParams::default().limit(1)).await?;
        Ok(())
    }

    async fn list_namespaces(&self) -> Result<Vec<String>> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let list = namespaces.list(&ListParams::default()).await?;
        Ok(list.items.iter().map(ResourceExt::name_any).collect())
    }

    async fn discover(&self) -> Result<Vec<DiscoveredGroup>> {
        let discovery = Discovery::new(self.client.clone()).run().await?;

        let mut groups = Vec::new();
        for group in discovery.groups() {
            let version = group.preferred_version_or_latest();
            let group_version = if group.name().is_empty() {
                version.to_string()
            } else {
                format!("{}/{version}", group.name())
            };
            let resources = group
                .versioned_resources(version)
                .into_iter()
                .map(|(ar, caps)| DiscoveredResource {
                    name: ar.plural,
                    kind: ar.kind,
                    namespaced: matches!(caps.scope, Scope::Namespaced),
                })
                .collect();
            groups.push(DiscoveredGroup {
                group_version,
                resources,
            });
        }
        Ok(groups)
    }

    async fn list_objects(
        &self,
        namespace: &str,
        resource_type: &ResourceType,
    ) -> Result<Vec<String>> {
        let api = self.dynamic_api(namespace, resource_type);
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items.iter().map(ResourceExt::name_any).collect())
    }

    async fn deletion_state(
        &self,
        namespace: &str,
        resource_type: &ResourceType,
        name: &str,
    ) -> Result<DeletionState> {
        let api = self.dynamic_api(namespace, resource_type);
        let obj = api.get(name).await?;
        Ok(match obj.metadata.deletion_timestamp {
            Some(ts) => DeletionState {
                is_deleting: true,
                deletion_timestamp: Some(ts.0),
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
        resource_type: &ResourceType,
        name: &str,
    ) -> Result<()> {
        let api = self.dynamic_api(namespace, resource_type);

        let mut obj = api.get(name).await?;
        obj.metadata.finalizers = None;
        api.replace(name, &PostParams::default(), &obj).await?;
        tracing::debug!(namespace, name, resource = %resource_type, "finalizers cleared");

        match api.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            // Clearing the finalizers can complete the pending deletion on
            // its own, in which case the object is already gone.
            Err(kube::Error::Api(err)) if err.code == 404 => {
                tracing::debug!(namespace, name, "object already gone after finalizer removal");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
