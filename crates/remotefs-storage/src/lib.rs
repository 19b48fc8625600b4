//! Remotefs Storage Library
//!
//! Storage driver abstraction and the remote (slave node) driver.
//!
//! A remote policy never touches bytes on the master. Content is served through
//! URLs signed with the node's shared secret, uploads go straight to the slave
//! through an upload session, and the slave reports completion by calling the
//! master's callback URL.
//!
//! # Signed URL format
//!
//! `sign=<base64url(HMAC-SHA256(secret, "<path>:<expires>"))>:<expires>` is
//! appended to the query, where `expires` is a Unix timestamp or `0` for URLs
//! with no expiry of their own.

pub mod capabilities;
pub mod client;
pub mod factory;
#[cfg(feature = "storage-remote")]
pub mod remote;
pub mod routes;
pub mod session;
pub mod signer;
pub mod traits;

// Re-export commonly used types
pub use capabilities::{Capabilities, Feature, FeatureSet};
pub use client::{ClientError, ClientResult, DeleteReport, SessionClient};
pub use factory::create_driver;
#[cfg(feature = "storage-remote")]
pub use remote::RemoteDriver;
pub use remotefs_core::PolicyType;
pub use session::{CallbackEvent, SessionState, UploadSession};
pub use signer::HmacSigner;
pub use traits::{DeleteOutcome, StorageDriver, StorageError, StorageResult};
