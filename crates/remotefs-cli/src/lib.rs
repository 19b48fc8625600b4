use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use remotefs_core::{Config, PolicyType, StoragePolicy};
use remotefs_node_client::HttpSessionClient;
use remotefs_storage::RemoteDriver;
use std::path::Path;
use std::sync::Arc;

/// Read a storage policy from a JSON file. Only remote policies are accepted.
pub fn load_policy(path: &Path) -> anyhow::Result<StoragePolicy> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read policy file {}", path.display()))?;
    let policy: StoragePolicy = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse policy file {}", path.display()))?;

    if policy.policy_type != PolicyType::Remote {
        anyhow::bail!(
            "Policy {} is of type {}, only remote policies are supported",
            policy.id,
            policy.policy_type
        );
    }
    Ok(policy)
}

/// Expiry `secs` seconds after `now`, or none for URLs that never expire.
pub fn expiry_after(now: DateTime<Utc>, secs: Option<u64>) -> anyhow::Result<Option<DateTime<Utc>>> {
    secs.map(|s| {
        let s = i64::try_from(s).context("Expiry is too large")?;
        Duration::try_seconds(s)
            .and_then(|d| now.checked_add_signed(d))
            .context("Expiry is out of range")
    })
    .transpose()
}

/// Remote driver for `policy`, talking to its node over HTTP.
pub fn build_driver(policy: StoragePolicy, config: &Config) -> anyhow::Result<RemoteDriver> {
    let client = HttpSessionClient::new(&policy.node, config)?;
    let driver = RemoteDriver::new(Arc::new(policy), config, Arc::new(client))?;
    Ok(driver)
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
