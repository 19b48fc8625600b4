use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;
use tokio::io::AsyncRead;

/// Byte stream of an upload. Dropping it closes the underlying source.
pub type UploadStream = Pin<Box<dyn AsyncRead + Send + Sync + Unpin>>;

/// Metadata describing one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadProps {
    pub upload_session_id: String,
    /// Logical destination URI in the file system of the master.
    pub uri: String,
    pub size: u64,
    /// Physical path on the slave, relative to the policy root.
    pub saved_path: String,
    pub expire_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// An upload carrying an open stream.
///
/// The stream is closed at most once: either explicitly through [`close`],
/// by a consumer that took it with [`take_stream`], or when the request drops.
///
/// [`close`]: UploadRequest::close
/// [`take_stream`]: UploadRequest::take_stream
pub struct UploadRequest {
    pub props: UploadProps,
    file: Option<UploadStream>,
}

impl UploadRequest {
    pub fn new(props: UploadProps, file: UploadStream) -> Self {
        Self {
            props,
            file: Some(file),
        }
    }

    /// Request without a body, used when only the metadata matters (token issuance).
    pub fn metadata_only(props: UploadProps) -> Self {
        Self { props, file: None }
    }

    pub fn stream_mut(&mut self) -> Option<&mut UploadStream> {
        self.file.as_mut()
    }

    /// Move the stream out; the caller becomes responsible for dropping it.
    pub fn take_stream(&mut self) -> Option<UploadStream> {
        self.file.take()
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    /// Release the stream. Idempotent.
    pub fn close(&mut self) {
        drop(self.file.take());
    }
}

impl Drop for UploadRequest {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("props", &self.props)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Credential bundle returned to the uploader after a session is issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadCredential {
    pub session_id: String,
    pub chunk_size: u64,
    pub upload_urls: Vec<String>,
    pub credential: String,
}
