//! The scan orchestrator: one cycle discovers resource types, walks every
//! namespace, records stuck objects and then hands the registry snapshot to
//! the reclaimer.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::watch;

use crate::cluster::{ClusterAccess, discovery};
use crate::error::Result;
use crate::health::Health;
use crate::metrics::Metrics;
use crate::models::{ResourceType, ScanResult, StuckObject};
use crate::reclaim;
use crate::registry::StuckRegistry;

/// Everything one scan cycle needs, constructed once at startup.
pub struct ScanContext {
    pub cluster: Arc<dyn ClusterAccess>,
    pub registry: Arc<StuckRegistry>,
    pub metrics: Arc<Metrics>,
    pub health: Arc<Health>,
    pub delete_after: chrono::Duration,
    pub interval: std::time::Duration,
}

/// Runs scan cycles until the shutdown signal fires.
///
/// An access verification failure is fatal: the loop returns the error and
/// the process exits, relying on restart-on-crash. Any other cycle failure is
/// logged and retried on the next interval.
pub async fn run_loop(ctx: ScanContext, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    loop {
        ctx.health.set_scanning(true);

        if let Err(e) = ctx.cluster.verify_access().await {
            ctx.health.set_connected(false);
            ctx.health.set_scanning(false);
            tracing::error!(error = %e, "failed to verify access to cluster");
            return Err(e);
        }
        ctx.health.set_connected(true);

        match run_scan(ctx.cluster.as_ref(), &ctx.registry, &ctx.metrics).await {
            Ok(result) if result.success => {
                tracing::info!(
                    namespaces = result.namespace_count,
                    objects = result.total_object_count,
                    "scan completed"
                );
            }
            Ok(result) => {
                tracing::warn!(
                    namespaces = result.namespace_count,
                    objects = result.total_object_count,
                    "scan completed with skipped resources"
                );
            }
            Err(e) => tracing::error!(error = %e, "scan cycle aborted"),
        }

        // Reclamation consumes the full registry, not just this cycle's
        // additions, so entries carried over from an aborted cycle still age
        // out.
        let snapshot = ctx.registry.list();
        let reclaimed =
            reclaim::reclaim_stale(ctx.cluster.as_ref(), &snapshot, ctx.delete_after, Utc::now())
                .await;
        if reclaimed > 0 {
            tracing::info!(count = reclaimed, "force deleted stale objects");
        }

        ctx.health.set_scanning(false);

        tokio::select! {
            _ = tokio::time::sleep(ctx.interval) => {}
            _ = shutdown.changed() => {
                tracing::info!("scan loop stopping");
                return Ok(());
            }
        }
    }
}

/// One full traversal: discovery, then a core pass and a custom pass over
/// every namespace. Discovery and namespace-list failures abort the cycle;
/// everything below that is isolated per namespace, resource or object.
pub async fn run_scan(
    cluster: &dyn ClusterAccess,
    registry: &StuckRegistry,
    metrics: &Metrics,
) -> Result<ScanResult> {
    let start = Instant::now();
    tracing::info!("starting scan");

    let groups = cluster.discover().await?;
    let all = discovery::filter_namespaced(&groups)?;
    let core = discovery::filter_core(&groups)?;
    let custom = discovery::filter_custom(&groups)?;
    tracing::info!(
        total = all.len(),
        core = core.len(),
        custom = custom.len(),
        "discovered namespaced resource types"
    );

    let namespaces = cluster.list_namespaces().await?;
    tracing::info!(count = namespaces.len(), "found namespaces");
    metrics.set_namespace_count(namespaces.len());

    let mut seen = Vec::new();
    let mut total_objects = 0;
    let mut failed_resources = 0;
    for ns in &namespaces {
        tracing::debug!(namespace = %ns, "scanning core resources");
        let core_pass = scan_namespace(cluster, registry, &mut seen, ns, &core).await;
        tracing::debug!(namespace = %ns, "scanning custom resources");
        let custom_pass = scan_namespace(cluster, registry, &mut seen, ns, &custom).await;
        total_objects += core_pass.objects + custom_pass.objects;
        failed_resources += core_pass.failed_resources + custom_pass.failed_resources;
    }

    // Entries not observed this cycle correspond to objects that finally went
    // away; drop them so the registry tracks what is stuck right now.
    registry.retain_cycle(&seen);
    metrics.set_stuck_count(registry.count());
    metrics.record_scan(start.elapsed(), total_objects);

    Ok(ScanResult {
        success: failed_resources == 0,
        namespace_count: namespaces.len(),
        total_object_count: total_objects,
    })
}

/// Outcome of scanning one namespace pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamespaceScan {
    /// Objects examined, stuck or not.
    pub objects: usize,
    /// Resource types skipped because of a non-benign error.
    pub failed_resources: usize,
}

/// Scans every given resource type in one namespace, returning the number of
/// objects examined. A failing resource type is logged and skipped; it never
/// takes the rest of the namespace down with it.
pub async fn scan_namespace(
    cluster: &dyn ClusterAccess,
    registry: &StuckRegistry,
    seen: &mut Vec<StuckObject>,
    namespace: &str,
    resource_types: &[ResourceType],
) -> NamespaceScan {
    let mut scan = NamespaceScan::default();
    for resource_type in resource_types {
        match scan_resource(cluster, registry, seen, namespace, resource_type).await {
            Ok(count) => scan.objects += count,
            Err(e) => {
                scan.failed_resources += 1;
                tracing::error!(
                    namespace,
                    resource = %resource_type,
                    error = %e,
                    "failed to scan resource, skipping"
                );
            }
        }
    }
    scan
}

async fn scan_resource(
    cluster: &dyn ClusterAccess,
    registry: &StuckRegistry,
    seen: &mut Vec<StuckObject>,
    namespace: &str,
    resource_type: &ResourceType,
) -> Result<usize> {
    let names = match cluster.list_objects(namespace, resource_type).await {
        Ok(names) => names,
        // Discovery can advertise kinds that are not actually served in this
        // cluster; that is not worth aborting anything over.
        Err(e) if e.is_not_found() => {
            tracing::warn!(namespace, resource = %resource_type, "resource not served, skipping");
            return Ok(0);
        }
        Err(e) => return Err(e),
    };

    if names.is_empty() {
        tracing::debug!(namespace, resource = %resource_type, "no objects found");
        return Ok(0);
    }

    for name in &names {
        match cluster.deletion_state(namespace, resource_type, name).await {
            Ok(state) if state.is_deleting => {
                if let Some(ts) = state.deletion_timestamp {
                    tracing::info!(
                        namespace,
                        name = %name,
                        resource = %resource_type,
                        "object is marked for deletion"
                    );
                    let obj = StuckObject {
                        namespace: namespace.to_string(),
                        resource: resource_type.resource.clone(),
                        name: name.clone(),
                        deletion_timestamp: ts,
                        group_version_resource: resource_type.clone(),
                    };
                    registry.record(obj.clone());
                    seen.push(obj);
                }
            }
            Ok(_) => {}
            // The object may have been deleted between list and get; treat it
            // as not stuck and keep going.
            Err(e) => {
                tracing::warn!(
                    namespace,
                    name = %name,
                    error = %e,
                    "failed to read deletion state"
                );
            }
        }
    }

    Ok(names.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::discovery::{DiscoveredGroup, DiscoveredResource};
    use crate::cluster::mock::MockCluster;

    fn rt(group: &str, version: &str, resource: &str, kind: &str) -> ResourceType {
        ResourceType {
            group: group.to_string(),
            version: version.to_string(),
            resource: resource.to_string(),
            kind: kind.to_string(),
        }
    }

    fn pods() -> ResourceType {
        rt("", "v1", "pods", "Pod")
    }

    #[tokio::test]
    async fn test_empty_namespace_yields_zero() {
        let cluster = MockCluster::default();
        let registry = StuckRegistry::new();
        let mut seen = Vec::new();

        let scan = scan_namespace(&cluster, &registry, &mut seen, "default", &[pods()]).await;
        assert_eq!(scan.objects, 0);
        assert_eq!(scan.failed_resources, 0);
        assert_eq!(registry.count(), 0);
    }

    #[tokio::test]
    async fn test_count_is_objects_examined_not_stuck() {
        let cluster = MockCluster::default()
            .with_objects("default", "pods", &["a", "b", "c"])
            .with_deleting("default", "pods", "b", Utc::now());
        let registry = StuckRegistry::new();
        let mut seen = Vec::new();

        let scan = scan_namespace(&cluster, &registry, &mut seen, "default", &[pods()]).await;
        assert_eq!(scan.objects, 3);
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.list()[0].name, "b");
    }

    #[tokio::test]
    async fn test_unserved_resource_does_not_abort_remaining_types() {
        let mut cluster = MockCluster::default().with_objects("default", "widgets", &["w1", "w2"]);
        cluster.unserved.insert("gadgets".to_string());

        let types = vec![
            rt("example.com", "v1", "gadgets", "Gadget"),
            rt("example.com", "v1", "widgets", "Widget"),
        ];
        let registry = StuckRegistry::new();
        let mut seen = Vec::new();

        let scan = scan_namespace(&cluster, &registry, &mut seen, "default", &types).await;
        assert_eq!(scan.objects, 2);
        // Not served is benign, not a failure.
        assert_eq!(scan.failed_resources, 0);
    }

    #[tokio::test]
    async fn test_list_failure_skips_type_but_continues() {
        let mut cluster = MockCluster::default().with_objects("default", "widgets", &["w1"]);
        cluster.fail_list.insert("gadgets".to_string());

        let types = vec![
            rt("example.com", "v1", "gadgets", "Gadget"),
            rt("example.com", "v1", "widgets", "Widget"),
        ];
        let registry = StuckRegistry::new();
        let mut seen = Vec::new();

        let scan = scan_namespace(&cluster, &registry, &mut seen, "default", &types).await;
        assert_eq!(scan.objects, 1);
        assert_eq!(scan.failed_resources, 1);
    }

    #[tokio::test]
    async fn test_get_failure_treated_as_not_stuck() {
        let mut cluster = MockCluster::default()
            .with_objects("default", "pods", &["a", "b"])
            .with_deleting("default", "pods", "a", Utc::now());
        cluster.fail_get.insert("a".to_string());

        let registry = StuckRegistry::new();
        let mut seen = Vec::new();

        let scan = scan_namespace(&cluster, &registry, &mut seen, "default", &[pods()]).await;
        assert_eq!(scan.objects, 2);
        assert_eq!(registry.count(), 0);
    }

    fn discovered() -> Vec<DiscoveredGroup> {
        vec![
            DiscoveredGroup {
                group_version: "v1".to_string(),
                resources: vec![DiscoveredResource {
                    name: "pods".to_string(),
                    kind: "Pod".to_string(),
                    namespaced: true,
                }],
            },
            DiscoveredGroup {
                group_version: "example.com/v1".to_string(),
                resources: vec![DiscoveredResource {
                    name: "widgets".to_string(),
                    kind: "Widget".to_string(),
                    namespaced: true,
                }],
            },
        ]
    }

    #[tokio::test]
    async fn test_run_scan_sums_both_passes_across_namespaces() {
        let mut cluster = MockCluster::default()
            .with_objects("default", "pods", &["p1", "p2"])
            .with_objects("kube-system", "pods", &["p3"])
            .with_objects("default", "widgets", &["w1"])
            .with_deleting("default", "widgets", "w1", Utc::now());
        cluster.namespaces = vec!["default".to_string(), "kube-system".to_string()];
        cluster.groups = discovered();

        let registry = StuckRegistry::new();
        let metrics = Metrics::new().unwrap();

        let result = run_scan(&cluster, &registry, &metrics).await.unwrap();
        assert!(result.success);
        assert_eq!(result.namespace_count, 2);
        assert_eq!(result.total_object_count, 4);
        assert_eq!(registry.count(), 1);

        let text = metrics.render().unwrap();
        assert!(text.contains("k8s_deletion_inspector_namespace_count 2"));
        assert!(text.contains("k8s_deletion_inspector_stuck_resources_total 1"));
    }

    #[tokio::test]
    async fn test_run_scan_reports_partial_failure() {
        let mut cluster = MockCluster::default().with_objects("default", "pods", &["p1"]);
        cluster.namespaces = vec!["default".to_string()];
        cluster.groups = discovered();
        cluster.fail_list.insert("widgets".to_string());

        let registry = StuckRegistry::new();
        let metrics = Metrics::new().unwrap();

        let result = run_scan(&cluster, &registry, &metrics).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.total_object_count, 1);
    }

    #[tokio::test]
    async fn test_run_scan_drops_entries_no_longer_observed() {
        let mut cluster = MockCluster::default();
        cluster.namespaces = vec!["default".to_string()];
        cluster.groups = discovered();

        let registry = StuckRegistry::new();
        registry.record(StuckObject {
            namespace: "default".to_string(),
            resource: "pods".to_string(),
            name: "gone".to_string(),
            deletion_timestamp: Utc::now(),
            group_version_resource: pods(),
        });

        let metrics = Metrics::new().unwrap();
        run_scan(&cluster, &registry, &metrics).await.unwrap();
        assert_eq!(registry.count(), 0);
    }

    #[tokio::test]
    async fn test_repeat_scans_keep_single_entry_per_object() {
        let mut cluster = MockCluster::default()
            .with_objects("default", "pods", &["stuck-pod"])
            .with_deleting("default", "pods", "stuck-pod", Utc::now());
        cluster.namespaces = vec!["default".to_string()];
        cluster.groups = discovered();

        let registry = StuckRegistry::new();
        let metrics = Metrics::new().unwrap();

        run_scan(&cluster, &registry, &metrics).await.unwrap();
        run_scan(&cluster, &registry, &metrics).await.unwrap();
        assert_eq!(registry.count(), 1);
    }
}
