use serde::Deserialize;

use crate::secret::NodeSecret;
use crate::storage_types::PolicyType;

/// A slave node a remote policy delegates to.
#[derive(Debug, Clone, Deserialize)]
pub struct Node {
    pub id: i64,
    pub name: String,
    /// Base URL of the slave, e.g. `https://slave-1.example.com`.
    pub server: String,
    /// Used only to sign URLs and RPCs. Never transmitted.
    pub secret: NodeSecret,
}

/// Per-policy tunables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    pub chunk_size: u64,
    pub thumb_exts: Vec<String>,
    pub thumb_max_size: u64,
    pub thumb_support_all_exts: bool,
    pub thumb_generator_proxy: bool,
    pub media_meta_exts: Vec<String>,
    pub media_meta_generator_proxy: bool,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            chunk_size: 25 << 20,
            thumb_exts: Vec::new(),
            thumb_max_size: 78_643_200,
            thumb_support_all_exts: false,
            thumb_generator_proxy: false,
            media_meta_exts: Vec::new(),
            media_meta_generator_proxy: false,
        }
    }
}

/// Configuration for one storage backend instance.
///
/// Owned by the policy store; drivers hold it behind an `Arc` and never mutate it.
#[derive(Debug, Clone, Deserialize)]
pub struct StoragePolicy {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub policy_type: PolicyType,
    pub node_id: i64,
    pub node: Node,
    #[serde(default)]
    pub settings: PolicySettings,
}
