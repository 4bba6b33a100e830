//! Force deletion of objects that have been stuck past the age threshold.

use chrono::{DateTime, Duration, Utc};

use crate::cluster::ClusterAccess;
use crate::models::StuckObject;

/// An entry qualifies once its deletion has been pending strictly longer than
/// the threshold.
fn is_stale(obj: &StuckObject, threshold: Duration, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(obj.deletion_timestamp) > threshold
}

/// Force-deletes every entry in the snapshot older than `threshold`,
/// returning how many were reclaimed.
///
/// Failures are per entry: logged, then on to the next one. The registry is
/// not mutated here; a reclaimed object simply stops being observed on the
/// following scan cycle.
pub async fn reclaim_stale(
    cluster: &dyn ClusterAccess,
    snapshot: &[StuckObject],
    threshold: Duration,
    now: DateTime<Utc>,
) -> usize {
    let mut reclaimed = 0;
    for obj in snapshot {
        if !is_stale(obj, threshold, now) {
            continue;
        }
        tracing::info!(
            namespace = %obj.namespace,
            name = %obj.name,
            resource = %obj.group_version_resource,
            deletion_timestamp = %obj.deletion_timestamp,
            "force deleting stuck object"
        );
        match cluster
            .force_delete(&obj.namespace, &obj.group_version_resource, &obj.name)
            .await
        {
            Ok(()) => {
                reclaimed += 1;
                tracing::info!(
                    namespace = %obj.namespace,
                    name = %obj.name,
                    "successfully force deleted stuck object"
                );
            }
            Err(e) => {
                tracing::error!(
                    namespace = %obj.namespace,
                    name = %obj.name,
                    error = %e,
                    "failed to force delete stuck object"
                );
            }
        }
    }
    reclaimed
}
