//! HTTP session client for slave nodes.
//!
//! Implements [`SessionClient`] over the slave's JSON API under
//! `{server}/api/v4/slave/`. Every request carries
//! `Authorization: Bearer <sign>`, a short-lived HMAC over `"<METHOD> <path>"`
//! made with the node's shared secret, and names the node it targets in
//! `X-Node-Id`.

mod response;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use remotefs_core::{Config, MediaMeta, Node, PhysicalObject, UploadProps, UploadRequest};
use remotefs_storage::{
    routes, ClientError, ClientResult, DeleteReport, HmacSigner, SessionClient, UploadSession,
};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tokio_util::io::ReaderStream;
use url::Url;

use response::{DeleteFailure, Envelope};

/// Header naming the node a request is meant for.
pub const NODE_ID_HEADER: &str = "X-Node-Id";

#[derive(Serialize)]
struct DeleteBody<'a> {
    files: &'a [String],
}

#[derive(Serialize)]
struct CreateSessionBody<'a> {
    #[serde(flatten)]
    props: &'a UploadProps,
    callback: Option<&'a str>,
    overwrite: bool,
}

/// HTTP client bound to one slave node.
#[derive(Clone, Debug)]
pub struct HttpSessionClient {
    client: Client,
    server: Url,
    node_id: i64,
    signer: HmacSigner,
    sign_ttl: TimeDelta,
}

impl HttpSessionClient {
    pub fn new(node: &Node, config: &Config) -> Result<Self> {
        let server = Url::parse(&node.server)
            .with_context(|| format!("Invalid server URL for node {}: {}", node.id, node.server))?;
        if server.cannot_be_a_base() {
            anyhow::bail!("Server URL for node {} cannot carry a path: {}", node.id, node.server);
        }

        let client = Client::builder()
            .timeout(config.slave_timeout())
            .build()
            .context("Failed to create HTTP client")?;

        let sign_ttl = TimeDelta::from_std(config.rpc_sign_ttl())
            .context("REMOTEFS_RPC_SIGN_TTL_SECS is out of range")?;

        Ok(Self {
            client,
            server,
            node_id: node.id,
            signer: HmacSigner::new(node.secret.clone()),
            sign_ttl,
        })
    }

    fn authorize(&self, method: Method, url: &Url) -> ClientResult<RequestBuilder> {
        let payload = format!("{} {}", method, url.path());
        let expires = Utc::now().checked_add_signed(self.sign_ttl).ok_or_else(|| {
            ClientError::Request(format!("RPC signature lifetime {} is out of range", self.sign_ttl))
        })?;
        let sign = self
            .signer
            .sign_payload(&payload, Some(expires))
            .map_err(|e| ClientError::Request(e.to_string()))?;

        Ok(self
            .client
            .request(method, url.clone())
            .bearer_auth(sign)
            .header(NODE_ID_HEADER, self.node_id.to_string()))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> ClientResult<Envelope<T>> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(
                node_id = self.node_id,
                path = %url.path(),
                error = %e,
                "Failed to reach slave node"
            );
            ClientError::Request(e.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(url.path().to_string()));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(
                node_id = self.node_id,
                path = %url.path(),
                status = %status,
                "Slave node rejected request"
            );
            return Err(ClientError::Request(format!(
                "Slave request failed with status {}: {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn request_delete(&self, paths: &[String]) -> ClientResult<Envelope<Vec<DeleteFailure>>> {
        let url = routes::slave_delete_url(&self.server);
        let request = self
            .authorize(Method::POST, &url)?
            .json(&DeleteBody { files: paths });
        self.send(request, &url).await
    }
}

#[async_trait]
impl SessionClient for HttpSessionClient {
    async fn list(&self, path: &str, recursive: bool) -> ClientResult<Vec<PhysicalObject>> {
        let url = routes::slave_list_url(&self.server, path, recursive);
        let request = self.authorize(Method::GET, &url)?;
        let envelope: Envelope<Vec<PhysicalObject>> = self.send(request, &url).await?;
        Ok(envelope.into_data()?.unwrap_or_default())
    }

    async fn upload(&self, request: &mut UploadRequest) -> ClientResult<()> {
        let path = request.props.saved_path.clone();
        let size = request.props.size;
        let stream = request.take_stream().ok_or_else(|| {
            ClientError::Request(format!("Upload to {} has no content stream", path))
        })?;

        let url = routes::slave_file_url(&self.server, &path, true);
        let start = Instant::now();

        let mut builder = self
            .authorize(Method::PUT, &url)?
            .body(reqwest::Body::wrap_stream(ReaderStream::new(stream)));
        if let Some(mime) = &request.props.mime_type {
            builder = builder.header(reqwest::header::CONTENT_TYPE, mime.as_str());
        }

        let envelope: Envelope<serde_json::Value> = self.send(builder, &url).await?;
        envelope.into_data()?;

        tracing::info!(
            node_id = self.node_id,
            path = %path,
            size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Uploaded file to slave node"
        );

        Ok(())
    }

    async fn delete_files(&self, paths: &[String]) -> DeleteReport {
        let envelope = match self.request_delete(paths).await {
            Ok(envelope) => envelope,
            Err(e) => {
                // Nothing is known to be deleted.
                return DeleteReport {
                    failed: paths.iter().map(|p| (p.clone(), e.to_string())).collect(),
                    error: Some(e),
                };
            }
        };

        let mut failed: BTreeMap<String, String> = envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|f| (f.path, f.reason))
            .collect();
        if envelope.code != 0 && failed.is_empty() {
            // The slave failed without naming paths; none is known to be deleted.
            failed = paths
                .iter()
                .map(|p| (p.clone(), envelope.msg.clone()))
                .collect();
        }
        let error = (envelope.code != 0).then(|| ClientError::Remote {
            code: envelope.code,
            message: envelope.msg,
        });

        if let Some(e) = &error {
            tracing::error!(node_id = self.node_id, error = %e, "Slave failed to delete files");
        }

        DeleteReport { failed, error }
    }

    async fn create_upload_session(
        &self,
        session: &UploadSession,
        overwrite: bool,
    ) -> ClientResult<()> {
        let url = routes::slave_upload_session_url(&self.server);
        let request = self.authorize(Method::PUT, &url)?.json(&CreateSessionBody {
            props: &session.props,
            callback: session.callback(),
            overwrite,
        });
        let envelope: Envelope<serde_json::Value> = self.send(request, &url).await?;
        envelope.into_data()?;

        tracing::info!(
            node_id = self.node_id,
            session_id = %session.id(),
            "Created upload session on slave node"
        );
        Ok(())
    }

    async fn get_upload_url(
        &self,
        expires: DateTime<Utc>,
        session_id: &str,
    ) -> ClientResult<(String, String)> {
        let url = routes::slave_upload_url(&self.server, session_id);
        let credential = self
            .signer
            .sign_payload(url.path(), Some(expires))
            .map_err(|e| ClientError::Request(e.to_string()))?;
        Ok((url.to_string(), credential))
    }

    async fn delete_upload_session(&self, session_id: &str) -> ClientResult<()> {
        let url = routes::slave_upload_url(&self.server, session_id);
        let request = self.authorize(Method::DELETE, &url)?;
        let envelope: Envelope<serde_json::Value> = self.send(request, &url).await?;
        envelope.into_data()?;
        Ok(())
    }

    async fn media_meta(&self, path: &str, ext: &str) -> ClientResult<Vec<MediaMeta>> {
        let url = routes::slave_media_meta_url(&self.server, path, ext);
        let request = self.authorize(Method::GET, &url)?;
        let envelope: Envelope<Vec<MediaMeta>> = self.send(request, &url).await?;
        Ok(envelope.into_data()?.unwrap_or_default())
    }
}
