#[cfg(feature = "storage-remote")]
use crate::RemoteDriver;
use crate::{PolicyType, SessionClient, StorageDriver, StorageError, StorageResult};
use remotefs_core::{Config, StoragePolicy};
use std::sync::Arc;

/// Create the storage driver for a policy.
///
/// `client` is the RPC client bound to the policy's node; it is ignored by
/// backends that do not delegate to a slave.
pub fn create_driver(
    policy: Arc<StoragePolicy>,
    config: &Config,
    client: Arc<dyn SessionClient>,
) -> StorageResult<Arc<dyn StorageDriver>> {
    match policy.policy_type {
        #[cfg(feature = "storage-remote")]
        PolicyType::Remote => {
            let driver = RemoteDriver::new(policy, config, client)?;
            Ok(Arc::new(driver))
        }

        #[cfg(not(feature = "storage-remote"))]
        PolicyType::Remote => Err(StorageError::Config(
            "Remote storage driver not available (storage-remote feature not enabled)".to_string(),
        )),

        other => Err(StorageError::Config(format!(
            "{} storage driver is not provided by this crate",
            other
        ))),
    }
}
