use crate::capabilities::{Capabilities, FeatureSet};
use crate::client::SessionClient;
use crate::routes;
use crate::session::UploadSession;
use crate::signer::HmacSigner;
use crate::traits::{DeleteOutcome, StorageDriver, StorageError, StorageResult};
use crate::PolicyType;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use remotefs_core::{
    Config, Entity, MediaMeta, NodeMode, PhysicalObject, SourceArgs, StoragePolicy,
    UploadCredential, UploadRequest,
};
use std::sync::Arc;
use url::Url;

/// Static features of the remote driver. Everything it can do beyond the
/// base contract is expressed through per-policy settings.
const FEATURES: FeatureSet = FeatureSet::empty();

/// Driver delegating storage to a slave node.
///
/// Holds only immutable configuration; every call may run concurrently.
#[derive(Clone)]
pub struct RemoteDriver {
    policy: Arc<StoragePolicy>,
    signer: HmacSigner,
    client: Arc<dyn SessionClient>,
    mode: NodeMode,
    site_url: Url,
}

impl RemoteDriver {
    /// Create a new RemoteDriver
    ///
    /// # Arguments
    /// * `policy` - Remote policy; its node provides the server URL and shared secret
    /// * `config` - Local process configuration (mode and public site URL)
    /// * `client` - RPC client bound to the policy's node
    pub fn new(
        policy: Arc<StoragePolicy>,
        config: &Config,
        client: Arc<dyn SessionClient>,
    ) -> StorageResult<Self> {
        let site_url = Url::parse(config.site_url()).map_err(|e| {
            StorageError::Config(format!("parse site url {} failed: {}", config.site_url(), e))
        })?;

        Ok(RemoteDriver {
            signer: HmacSigner::new(policy.node.secret.clone()),
            policy,
            client,
            mode: config.mode(),
            site_url,
        })
    }

    pub fn policy(&self) -> &StoragePolicy {
        &self.policy
    }

    fn server_url(&self) -> StorageResult<Url> {
        let server = &self.policy.node.server;
        let url = Url::parse(server)
            .map_err(|e| StorageError::Config(format!("parse server url {} failed: {}", server, e)))?;
        if url.cannot_be_a_base() {
            return Err(StorageError::Config(format!(
                "server url {} cannot carry a path",
                server
            )));
        }
        Ok(url)
    }

    /// Node ID embedded in content URLs. Only a slave building URLs for itself
    /// names its node, which keeps the serving node from redirecting again.
    fn content_node_id(&self) -> i64 {
        match self.mode {
            NodeMode::Slave => self.policy.node_id,
            NodeMode::Master => 0,
        }
    }
}

#[async_trait]
impl StorageDriver for RemoteDriver {
    async fn list(
        &self,
        base: &str,
        recursive: bool,
        on_progress: &(dyn Fn(usize) + Send + Sync),
    ) -> StorageResult<Vec<PhysicalObject>> {
        let objects = self
            .client
            .list(base, recursive)
            .await
            .map_err(|e| StorageError::transport("list", base, e))?;

        on_progress(objects.len());

        tracing::debug!(
            policy_id = self.policy.id,
            base = %base,
            recursive,
            count = objects.len(),
            "Listed remote objects"
        );

        Ok(objects)
    }

    async fn open(&self, _path: &str) -> StorageResult<tokio::fs::File> {
        Err(StorageError::Unsupported("open"))
    }

    fn local_path(&self, _path: &str) -> String {
        String::new()
    }

    async fn put(&self, mut request: UploadRequest) -> StorageResult<()> {
        let target = request.props.saved_path.clone();
        let start = std::time::Instant::now();

        let result = self.client.upload(&mut request).await;
        request.close();

        result.map_err(|e| StorageError::transport("upload", target.clone(), e))?;

        tracing::debug!(
            policy_id = self.policy.id,
            path = %target,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Remote upload finished"
        );

        Ok(())
    }

    async fn delete(&self, paths: &[String]) -> DeleteOutcome {
        let report = self.client.delete_files(paths).await;

        let error = report.error.map(|e| {
            StorageError::transport("delete", format!("{} file(s)", paths.len()), e)
        });

        DeleteOutcome {
            failed: report.failed,
            error,
        }
    }

    async fn thumb(
        &self,
        expire: Option<DateTime<Utc>>,
        ext: &str,
        entity: &Entity,
    ) -> StorageResult<String> {
        let server = self.server_url()?;
        let thumb_url = routes::slave_thumb_url(&server, &entity.source, ext);
        let signed = self.signer.sign_uri(thumb_url.as_str(), expire)?;
        Ok(signed.to_string())
    }

    async fn source(&self, entity: &Entity, args: &SourceArgs) -> StorageResult<String> {
        let server = self.server_url()?;

        let base = routes::slave_file_content_url(
            &server,
            &entity.source,
            &args.display_name,
            args.is_download,
            args.speed,
            self.content_node_id(),
        );

        let signed = self
            .signer
            .sign_uri(base.as_str(), args.expire)
            .map_err(|e| match e {
                StorageError::Signing(msg) => StorageError::Signing(format!(
                    "failed to sign internal slave content URL: {}",
                    msg
                )),
                other => other,
            })?;

        Ok(signed.to_string())
    }

    async fn token(
        &self,
        session: &mut UploadSession,
        _request: &UploadRequest,
    ) -> StorageResult<UploadCredential> {
        let callback = routes::master_slave_callback_url(
            &self.site_url,
            PolicyType::Remote,
            session.id(),
            session.callback_secret(),
        );
        session.stamp_callback(callback.to_string())?;

        if let Err(e) = self.client.create_upload_session(session, false).await {
            session.clear_callback();
            return Err(StorageError::transport(
                "create_upload_session",
                session.id(),
                e,
            ));
        }
        // From here on the slave knows the session; a failure below must be
        // reconciled with cancel_token.
        session.mark_issued()?;

        let (upload_url, credential) = self
            .client
            .get_upload_url(session.expire_at(), session.id())
            .await
            .map_err(|e| StorageError::transport("sign_upload_url", session.id(), e))?;

        tracing::debug!(
            policy_id = self.policy.id,
            session_id = %session.id(),
            "Issued remote upload session"
        );

        Ok(UploadCredential {
            session_id: session.id().to_string(),
            chunk_size: self.policy.settings.chunk_size,
            upload_urls: vec![upload_url],
            credential,
        })
    }

    async fn cancel_token(&self, session: &mut UploadSession) -> StorageResult<()> {
        session.ensure_issued("cancel")?;

        self.client
            .delete_upload_session(session.id())
            .await
            .map_err(|e| StorageError::transport("delete_upload_session", session.id(), e))?;

        session.mark_cancelled()
    }

    async fn complete_upload(&self, _session: &UploadSession) -> StorageResult<()> {
        // The slave reports completion through the callback URL.
        Ok(())
    }

    fn capabilities(&self) -> Capabilities {
        let settings = &self.policy.settings;
        Capabilities {
            static_features: FEATURES,
            media_meta_supported_exts: settings.media_meta_exts.clone(),
            media_meta_proxy: settings.media_meta_generator_proxy,
            thumb_supported_exts: settings.thumb_exts.clone(),
            thumb_proxy: settings.thumb_generator_proxy,
            thumb_max_size: settings.thumb_max_size,
            thumb_support_all_exts: settings.thumb_support_all_exts,
        }
    }

    async fn media_meta(&self, path: &str, ext: &str) -> StorageResult<Vec<MediaMeta>> {
        self.client
            .media_meta(path, ext)
            .await
            .map_err(|e| StorageError::transport("media_meta", path, e))
    }

    fn policy_type(&self) -> PolicyType {
        PolicyType::Remote
    }
}
