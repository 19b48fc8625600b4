//! Contract of the component that performs RPCs against a slave node.
//!
//! The driver only composes these calls with URL signing; transport, retries
//! and connection pooling belong to the implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use remotefs_core::{MediaMeta, PhysicalObject, UploadRequest};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::session::UploadSession;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Slave returned error {code}: {message}")]
    Remote { code: i32, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Result of a batch delete.
///
/// `failed` maps each path the slave did not delete to the reason it gave.
/// `error` is set when the call itself failed; `failed` may still carry what
/// the slave reported before the failure.
#[derive(Debug, Default)]
pub struct DeleteReport {
    pub failed: BTreeMap<String, String>,
    pub error: Option<ClientError>,
}

#[async_trait]
pub trait SessionClient: Send + Sync {
    /// List objects under `path` on the slave.
    async fn list(&self, path: &str, recursive: bool) -> ClientResult<Vec<PhysicalObject>>;

    /// Stream `request` to the slave. Implementations may take the stream out
    /// of the request; whatever they leave behind is closed by the caller.
    async fn upload(&self, request: &mut UploadRequest) -> ClientResult<()>;

    async fn delete_files(&self, paths: &[String]) -> DeleteReport;

    async fn create_upload_session(
        &self,
        session: &UploadSession,
        overwrite: bool,
    ) -> ClientResult<()>;

    /// Returns the upload URL and the signed credential the uploader presents.
    async fn get_upload_url(
        &self,
        expires: DateTime<Utc>,
        session_id: &str,
    ) -> ClientResult<(String, String)>;

    async fn delete_upload_session(&self, session_id: &str) -> ClientResult<()>;

    async fn media_meta(&self, path: &str, ext: &str) -> ClientResult<Vec<MediaMeta>>;
}
