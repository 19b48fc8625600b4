//! Storage driver abstraction
//!
//! This module defines the `StorageDriver` trait every backend implements, so
//! the file manager can work with any policy without knowing where bytes live.

use crate::capabilities::Capabilities;
use crate::client::ClientError;
use crate::session::{SessionState, UploadSession};
use crate::PolicyType;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use remotefs_core::{Entity, MediaMeta, PhysicalObject, SourceArgs, UploadCredential, UploadRequest};
use std::collections::BTreeMap;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Operation not supported by this driver: {0}")]
    Unsupported(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("{operation} failed for {target}: {source}")]
    Transport {
        operation: &'static str,
        target: String,
        #[source]
        source: ClientError,
    },

    #[error("Cannot {action} upload session {session_id} in state {state}")]
    InvalidSessionState {
        session_id: String,
        state: SessionState,
        action: &'static str,
    },

    #[error("Upload callback rejected: {0}")]
    CallbackRejected(String),
}

impl StorageError {
    pub(crate) fn transport(
        operation: &'static str,
        target: impl Into<String>,
        source: ClientError,
    ) -> Self {
        StorageError::Transport {
            operation,
            target: target.into(),
            source,
        }
    }

    /// Only transport failures may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Transport { .. })
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Outcome of deleting several paths.
///
/// Partial failure is data, not an error: `failed` holds every path that was
/// not deleted with the reason reported for it, and `error` the last failure
/// of the call itself.
#[derive(Debug, Default)]
pub struct DeleteOutcome {
    pub failed: BTreeMap<String, String>,
    pub error: Option<StorageError>,
}

impl DeleteOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.error.is_none()
    }

    pub fn failed_paths(&self) -> Vec<String> {
        self.failed.keys().cloned().collect()
    }

    /// Collapse into `(failed paths, last error)`.
    pub fn into_parts(self) -> (Vec<String>, Option<StorageError>) {
        (self.failed.into_keys().collect(), self.error)
    }
}

/// Storage driver trait
///
/// Implemented by every backend (local disk, remote slave node, object
/// storage). The implementation for a policy is picked by
/// [`create_driver`](crate::factory::create_driver).
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// List physical objects under `base`.
    ///
    /// `on_progress` is called once with the number of objects found before
    /// a successful return.
    async fn list(
        &self,
        base: &str,
        recursive: bool,
        on_progress: &(dyn Fn(usize) + Send + Sync),
    ) -> StorageResult<Vec<PhysicalObject>>;

    /// Open a physical file for reading.
    async fn open(&self, path: &str) -> StorageResult<tokio::fs::File>;

    /// Path of the file on the local disk, empty when there is none.
    fn local_path(&self, path: &str) -> String;

    /// Store the stream carried by `request`. The stream is closed before
    /// returning, whatever the outcome.
    async fn put(&self, request: UploadRequest) -> StorageResult<()>;

    /// Delete one or more physical files.
    async fn delete(&self, paths: &[String]) -> DeleteOutcome;

    /// URL of a thumbnail for `entity` in format `ext`.
    async fn thumb(
        &self,
        expire: Option<DateTime<Utc>>,
        ext: &str,
        entity: &Entity,
    ) -> StorageResult<String>;

    /// URL serving the content of `entity`.
    async fn source(&self, entity: &Entity, args: &SourceArgs) -> StorageResult<String>;

    /// Prepare an upload session and return the credential for the uploader.
    async fn token(
        &self,
        session: &mut UploadSession,
        request: &UploadRequest,
    ) -> StorageResult<UploadCredential>;

    /// Tear down a session created by [`token`](StorageDriver::token).
    async fn cancel_token(&self, session: &mut UploadSession) -> StorageResult<()>;

    /// Finalize an upload from the client side.
    async fn complete_upload(&self, session: &UploadSession) -> StorageResult<()>;

    fn capabilities(&self) -> Capabilities;

    /// Extract media metadata from a physical file.
    async fn media_meta(&self, path: &str, ext: &str) -> StorageResult<Vec<MediaMeta>>;

    fn policy_type(&self) -> PolicyType;
}
