//! Filtering of raw API discovery output into the resource type lists the
//! scanner iterates.

use crate::error::{AppError, Result};
use crate::models::ResourceType;

/// One group-version as reported by API discovery.
#[derive(Debug, Clone)]
pub struct DiscoveredGroup {
    /// `v1` for the core group, `group/version` otherwise.
    pub group_version: String,
    pub resources: Vec<DiscoveredResource>,
}

/// One resource within a group-version.
#[derive(Debug, Clone)]
pub struct DiscoveredResource {
    /// Plural name, e.g. `pods`.
    pub name: String,
    pub kind: String,
    pub namespaced: bool,
}

/// Group-versions skipped during discovery. The metrics aggregation API
/// serves ephemeral readings, not authoritative objects, so listing it for
/// deletion tracking is wasted work.
pub fn should_ignore_group(group_version: &str) -> bool {
    group_version.contains("metrics.k8s.io")
}

fn is_core_group_version(group_version: &str) -> bool {
    group_version == "v1" || group_version == "core"
}

/// Splits a `group/version` string; the core group has no group part.
pub fn parse_group_version(group_version: &str) -> Result<(String, String)> {
    let mut parts = group_version.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(version), None, _) => Ok((String::new(), version.to_string())),
        (Some(group), Some(version), None) => Ok((group.to_string(), version.to_string())),
        _ => Err(AppError::Discovery(format!(
            "malformed group version: {group_version}"
        ))),
    }
}

fn collect(groups: &[DiscoveredGroup], keep: impl Fn(&str) -> bool) -> Result<Vec<ResourceType>> {
    let mut types = Vec::new();
    for group in groups {
        if should_ignore_group(&group.group_version) {
            tracing::debug!(group_version = %group.group_version, "ignoring group version");
            continue;
        }
        if !keep(&group.group_version) {
            continue;
        }
        let (group_name, version) = parse_group_version(&group.group_version)?;
        for resource in &group.resources {
            if !resource.namespaced {
                continue;
            }
            types.push(ResourceType {
                group: group_name.clone(),
                version: version.clone(),
                resource: resource.name.clone(),
                kind: resource.kind.clone(),
            });
        }
    }
    Ok(types)
}

/// Every namespaced resource type served by the cluster, built-in and custom.
pub fn filter_namespaced(groups: &[DiscoveredGroup]) -> Result<Vec<ResourceType>> {
    collect(groups, |_| true)
}

/// Namespaced resource types in the core (`v1`) group only, scanned ahead of
/// everything else.
pub fn filter_core(groups: &[DiscoveredGroup]) -> Result<Vec<ResourceType>> {
    collect(groups, is_core_group_version)
}

/// Namespaced resource types outside the core group. Disjoint from
/// [`filter_core`], so the scanner's two passes never list a kind twice.
pub fn filter_custom(groups: &[DiscoveredGroup]) -> Result<Vec<ResourceType>> {
    collect(groups, |gv| !is_core_group_version(gv))
}
