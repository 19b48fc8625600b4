//! Remotefs Core Library
//!
//! Domain models, storage policy types and process configuration shared by the
//! remote storage driver, the slave node client and the CLI.

pub mod config;
pub mod models;
pub mod secret;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, NodeMode};
pub use models::{
    Entity, MediaMeta, Node, PhysicalObject, PolicySettings, SourceArgs, StoragePolicy,
    UploadCredential, UploadProps, UploadRequest, UploadStream,
};
pub use secret::NodeSecret;
pub use storage_types::PolicyType;
