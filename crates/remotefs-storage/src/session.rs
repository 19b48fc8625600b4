//! Upload session lifecycle.
//!
//! ```text
//! Unstarted --token--> Issued --callback--> Completed
//!                         |----cancel_token--> Cancelled
//!                         `----expiry--------> Expired
//! ```
//!
//! Terminal states accept no further transition. Completion is driven by the
//! slave calling the callback URL stamped at issuance; the orchestrator feeds
//! that call back in as a [`CallbackEvent`].

use crate::traits::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use rand::Rng;
use remotefs_core::UploadProps;
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;
use uuid::Uuid;

const CALLBACK_SECRET_BYTES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unstarted,
    Issued,
    Completed,
    Cancelled,
    Expired,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Unstarted => "unstarted",
            SessionState::Issued => "issued",
            SessionState::Completed => "completed",
            SessionState::Cancelled => "cancelled",
            SessionState::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// Inbound completion call from a slave, correlated by session ID and
/// authenticated by the callback secret.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackEvent {
    pub session_id: String,
    pub callback_secret: String,
}

/// An in-flight upload.
#[derive(Clone)]
pub struct UploadSession {
    pub props: UploadProps,
    callback: Option<String>,
    callback_secret: String,
    state: SessionState,
}

fn generate_callback_secret() -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..CALLBACK_SECRET_BYTES).map(|_| rng.random()).collect();
    hex::encode(bytes)
}

impl UploadSession {
    /// New session in `Unstarted`. A session ID is generated when `props`
    /// does not carry one yet.
    pub fn new(mut props: UploadProps) -> Self {
        if props.upload_session_id.is_empty() {
            props.upload_session_id = Uuid::new_v4().to_string();
        }
        Self {
            props,
            callback: None,
            callback_secret: generate_callback_secret(),
            state: SessionState::Unstarted,
        }
    }

    pub fn id(&self) -> &str {
        &self.props.upload_session_id
    }

    pub fn expire_at(&self) -> DateTime<Utc> {
        self.props.expire_at
    }

    pub fn callback(&self) -> Option<&str> {
        self.callback.as_deref()
    }

    pub fn callback_secret(&self) -> &str {
        &self.callback_secret
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn invalid(&self, action: &'static str) -> StorageError {
        StorageError::InvalidSessionState {
            session_id: self.id().to_string(),
            state: self.state,
            action,
        }
    }

    pub(crate) fn stamp_callback(&mut self, url: String) -> StorageResult<()> {
        if self.state != SessionState::Unstarted || self.callback.is_some() {
            return Err(self.invalid("issue"));
        }
        self.callback = Some(url);
        Ok(())
    }

    /// Undo [`stamp_callback`](Self::stamp_callback) when the remote session
    /// could not be created, so issuance can be retried.
    pub(crate) fn clear_callback(&mut self) {
        if self.state == SessionState::Unstarted {
            self.callback = None;
        }
    }

    pub(crate) fn mark_issued(&mut self) -> StorageResult<()> {
        if self.state != SessionState::Unstarted || self.callback.is_none() {
            return Err(self.invalid("issue"));
        }
        self.state = SessionState::Issued;
        Ok(())
    }

    pub(crate) fn ensure_issued(&self, action: &'static str) -> StorageResult<()> {
        if self.state != SessionState::Issued {
            return Err(self.invalid(action));
        }
        Ok(())
    }

    pub(crate) fn mark_cancelled(&mut self) -> StorageResult<()> {
        self.ensure_issued("cancel")?;
        self.state = SessionState::Cancelled;
        Ok(())
    }

    /// Apply the slave's completion callback.
    pub fn complete_from_callback(&mut self, event: &CallbackEvent) -> StorageResult<()> {
        self.ensure_issued("complete")?;
        if event.session_id != self.id() {
            return Err(StorageError::CallbackRejected(format!(
                "callback for session {} delivered to session {}",
                event.session_id,
                self.id()
            )));
        }
        let matches: bool = event
            .callback_secret
            .as_bytes()
            .ct_eq(self.callback_secret.as_bytes())
            .into();
        if !matches {
            return Err(StorageError::CallbackRejected(format!(
                "invalid callback secret for session {}",
                self.id()
            )));
        }
        self.state = SessionState::Completed;
        Ok(())
    }

    /// Move an issued session past its expiry to `Expired`. Returns whether
    /// the state changed.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.state == SessionState::Issued && now >= self.props.expire_at {
            self.state = SessionState::Expired;
            return true;
        }
        false
    }
}

impl fmt::Debug for UploadSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSession")
            .field("id", &self.props.upload_session_id)
            .field("uri", &self.props.uri)
            .field("expire_at", &self.props.expire_at)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn props(id: &str) -> UploadProps {
        UploadProps {
            upload_session_id: id.to_string(),
            uri: "/docs/a.pdf".to_string(),
            size: 42,
            saved_path: "1/a.pdf".to_string(),
            expire_at: Utc::now() + Duration::hours(1),
            last_modified: None,
            mime_type: None,
        }
    }

    fn issued() -> UploadSession {
        let mut session = UploadSession::new(props("s-1"));
        session.stamp_callback("https://m/cb".to_string()).unwrap();
        session.mark_issued().unwrap();
        session
    }

    #[test]
    fn new_session_generates_id_and_secret() {
        let a = UploadSession::new(props(""));
        let b = UploadSession::new(props(""));
        assert!(Uuid::parse_str(a.id()).is_ok());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.callback_secret().len(), CALLBACK_SECRET_BYTES * 2);
        assert_ne!(a.callback_secret(), b.callback_secret());
        assert_eq!(a.state(), SessionState::Unstarted);
        assert!(a.callback().is_none());
    }

    #[test]
    fn existing_id_is_kept() {
        assert_eq!(UploadSession::new(props("keep-me")).id(), "keep-me");
    }

    #[test]
    fn callback_can_only_be_stamped_once() {
        let mut session = UploadSession::new(props("s"));
        session.stamp_callback("a".to_string()).unwrap();
        let err = session.stamp_callback("b".to_string()).unwrap_err();
        assert!(matches!(err, StorageError::InvalidSessionState { .. }));
        assert_eq!(session.callback(), Some("a"));
    }

    #[test]
    fn issue_requires_callback() {
        let mut session = UploadSession::new(props("s"));
        assert!(session.mark_issued().is_err());
    }

    #[test]
    fn cancel_from_unstarted_is_rejected() {
        let mut session = UploadSession::new(props("s"));
        let err = session.mark_cancelled().unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidSessionState {
                state: SessionState::Unstarted,
                action: "cancel",
                ..
            }
        ));
    }

    #[test]
    fn callback_completes_issued_session() {
        let mut session = issued();
        let event = CallbackEvent {
            session_id: session.id().to_string(),
            callback_secret: session.callback_secret().to_string(),
        };
        session.complete_from_callback(&event).unwrap();
        assert_eq!(session.state(), SessionState::Completed);

        // terminal
        assert!(session.complete_from_callback(&event).is_err());
        assert!(session.mark_cancelled().is_err());
        assert!(!session.expire_if_due(Utc::now() + Duration::days(1)));
    }

    #[test]
    fn callback_with_wrong_secret_or_id_is_rejected() {
        let mut session = issued();
        let wrong_secret = CallbackEvent {
            session_id: session.id().to_string(),
            callback_secret: "nope".to_string(),
        };
        assert!(matches!(
            session.complete_from_callback(&wrong_secret),
            Err(StorageError::CallbackRejected(_))
        ));

        let wrong_id = CallbackEvent {
            session_id: "other".to_string(),
            callback_secret: session.callback_secret().to_string(),
        };
        assert!(matches!(
            session.complete_from_callback(&wrong_id),
            Err(StorageError::CallbackRejected(_))
        ));
        assert_eq!(session.state(), SessionState::Issued);
    }

    #[test]
    fn expiry_only_applies_to_issued_sessions_past_deadline() {
        let mut session = issued();
        assert!(!session.expire_if_due(Utc::now()));
        assert!(session.expire_if_due(session.expire_at()));
        assert_eq!(session.state(), SessionState::Expired);

        let mut fresh = UploadSession::new(props("s"));
        assert!(!fresh.expire_if_due(Utc::now() + Duration::days(1)));
    }

    #[test]
    fn debug_does_not_leak_callback_secret() {
        let session = issued();
        let out = format!("{:?}", session);
        assert!(!out.contains(session.callback_secret()));
    }
}
