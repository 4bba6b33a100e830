use std::time::Duration;

use clap::Parser;

/// Runtime settings, from flags with environment-variable fallbacks.
#[derive(Debug, Clone, Parser)]
#[command(name = "k8s-deletion-inspector", version, about = "Finds and reclaims Kubernetes objects stuck in a terminating state")]
pub struct Settings {
    /// Enable debug logging
    #[arg(long, env = "DEBUG", default_value_t = true, action = clap::ArgAction::Set)]
    pub debug: bool,

    /// Port for the metrics and health server
    #[arg(long, env = "METRICS_PORT", default_value_t = 9000)]
    pub metrics_port: u16,

    /// Path to the kubeconfig file; empty selects in-cluster or default resolution
    #[arg(long, env = "KUBECONFIG", default_value = "")]
    pub kubeconfig: String,

    /// Hours an object must be stuck in deletion before it is force deleted
    #[arg(long, env = "DELETE_AFTER", default_value_t = 72)]
    pub delete_after: u32,

    /// Hours between scan cycles
    #[arg(long, env = "SCAN_INTERVAL", default_value_t = 24)]
    pub scan_interval: u32,
}

impl Settings {
    /// Age threshold beyond which a stuck object qualifies for reclamation.
    pub fn delete_after(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.delete_after))
    }

    /// Sleep between scan cycles.
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.scan_interval) * 3600)
    }
}
