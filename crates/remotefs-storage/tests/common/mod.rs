//! Shared fixtures and a recording session client for driver tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use remotefs_core::{
    Config, MediaMeta, Node, NodeMode, NodeSecret, PhysicalObject, PolicySettings, PolicyType,
    StoragePolicy, UploadProps, UploadRequest, UploadStream,
};
use remotefs_storage::{ClientError, ClientResult, DeleteReport, SessionClient, UploadSession};
use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

pub const SERVER: &str = "https://slave.example.com";
pub const SITE: &str = "https://master.example.com";
pub const NODE_ID: i64 = 7;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List { path: String, recursive: bool },
    Upload { path: String, bytes: Vec<u8> },
    Delete(Vec<String>),
    CreateSession { id: String, callback: Option<String>, overwrite: bool },
    GetUploadUrl { id: String, expires: DateTime<Utc> },
    DeleteSession(String),
    MediaMeta { path: String, ext: String },
}

/// Session client that records every call and answers from its fields.
#[derive(Default)]
pub struct MockSessionClient {
    pub calls: Mutex<Vec<Call>>,
    pub objects: Vec<PhysicalObject>,
    pub fail_list: bool,
    pub fail_upload: bool,
    /// Take the stream out of the request instead of reading it in place.
    pub take_stream: bool,
    pub delete_failed: BTreeMap<String, String>,
    pub delete_error: Option<String>,
    pub fail_create_session: bool,
    pub fail_upload_url: bool,
    pub fail_delete_session: bool,
    pub media: Vec<MediaMeta>,
    pub fail_media: bool,
}

impl MockSessionClient {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn failure(what: &str) -> ClientError {
    ClientError::Request(format!("{} failed: connection refused", what))
}

#[async_trait]
impl SessionClient for MockSessionClient {
    async fn list(&self, path: &str, recursive: bool) -> ClientResult<Vec<PhysicalObject>> {
        self.record(Call::List {
            path: path.to_string(),
            recursive,
        });
        if self.fail_list {
            return Err(failure("list"));
        }
        Ok(self.objects.clone())
    }

    async fn upload(&self, request: &mut UploadRequest) -> ClientResult<()> {
        let mut bytes = Vec::new();
        if self.take_stream {
            if let Some(mut stream) = request.take_stream() {
                stream.read_to_end(&mut bytes).await?;
            }
        } else if let Some(stream) = request.stream_mut() {
            stream.read_to_end(&mut bytes).await?;
        }
        self.record(Call::Upload {
            path: request.props.saved_path.clone(),
            bytes,
        });
        if self.fail_upload {
            return Err(failure("upload"));
        }
        Ok(())
    }

    async fn delete_files(&self, paths: &[String]) -> DeleteReport {
        self.record(Call::Delete(paths.to_vec()));
        DeleteReport {
            failed: self.delete_failed.clone(),
            error: self.delete_error.as_ref().map(|m| ClientError::Request(m.clone())),
        }
    }

    async fn create_upload_session(
        &self,
        session: &UploadSession,
        overwrite: bool,
    ) -> ClientResult<()> {
        self.record(Call::CreateSession {
            id: session.id().to_string(),
            callback: session.callback().map(str::to_string),
            overwrite,
        });
        if self.fail_create_session {
            return Err(failure("create session"));
        }
        Ok(())
    }

    async fn get_upload_url(
        &self,
        expires: DateTime<Utc>,
        session_id: &str,
    ) -> ClientResult<(String, String)> {
        self.record(Call::GetUploadUrl {
            id: session_id.to_string(),
            expires,
        });
        if self.fail_upload_url {
            return Err(failure("upload url"));
        }
        Ok((
            format!("{}/api/v4/slave/upload/{}", SERVER, session_id),
            "credential-sig:123".to_string(),
        ))
    }

    async fn delete_upload_session(&self, session_id: &str) -> ClientResult<()> {
        self.record(Call::DeleteSession(session_id.to_string()));
        if self.fail_delete_session {
            return Err(ClientError::NotFound(session_id.to_string()));
        }
        Ok(())
    }

    async fn media_meta(&self, path: &str, ext: &str) -> ClientResult<Vec<MediaMeta>> {
        self.record(Call::MediaMeta {
            path: path.to_string(),
            ext: ext.to_string(),
        });
        if self.fail_media {
            return Err(ClientError::Remote {
                code: 500,
                message: "exiftool crashed".to_string(),
            });
        }
        Ok(self.media.clone())
    }
}

/// Reader that yields `data` once and counts how many times it is dropped.
pub struct CountingStream {
    data: Vec<u8>,
    drops: Arc<AtomicUsize>,
}

impl AsyncRead for CountingStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let n = self.data.len().min(buf.remaining());
        let chunk: Vec<u8> = self.data.drain(..n).collect();
        buf.put_slice(&chunk);
        Poll::Ready(Ok(()))
    }
}

impl Drop for CountingStream {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn counting_stream(data: &[u8], drops: &Arc<AtomicUsize>) -> UploadStream {
    Box::pin(CountingStream {
        data: data.to_vec(),
        drops: drops.clone(),
    })
}

pub fn expiry() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2031, 6, 1, 12, 0, 0).unwrap()
}

pub fn policy_with(server: &str, secret: &str, settings: PolicySettings) -> Arc<StoragePolicy> {
    Arc::new(StoragePolicy {
        id: 1,
        name: "slave-policy".to_string(),
        policy_type: PolicyType::Remote,
        node_id: NODE_ID,
        node: Node {
            id: NODE_ID,
            name: "slave-1".to_string(),
            server: server.to_string(),
            secret: NodeSecret::new(secret),
        },
        settings,
    })
}

pub fn policy() -> Arc<StoragePolicy> {
    policy_with(SERVER, "node-secret", PolicySettings::default())
}

pub fn config(mode: NodeMode) -> Config {
    Config {
        mode,
        site_url: SITE.to_string(),
        ..Config::default()
    }
}

pub fn props(session_id: &str) -> UploadProps {
    UploadProps {
        upload_session_id: session_id.to_string(),
        uri: "/photos/cat.jpg".to_string(),
        size: 5,
        saved_path: "uploads/1/cat.jpg".to_string(),
        expire_at: Utc::now() + Duration::hours(2),
        last_modified: None,
        mime_type: Some("image/jpeg".to_string()),
    }
}

pub fn object(name: &str) -> PhysicalObject {
    PhysicalObject {
        name: name.to_string(),
        source: format!("uploads/{}", name),
        relative_path: name.to_string(),
        size: 10,
        is_dir: false,
        last_modify: expiry(),
    }
}
