//! Shared secret of a slave node.
//!
//! The secret is only ever fed into an HMAC. It has no `Display` and no
//! `Serialize` impl, and its `Debug` output is redacted, so it cannot end up in
//! a produced URL, a log line or a serialized policy by accident.

use serde::{Deserialize, Deserializer};
use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct NodeSecret(String);

impl NodeSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        NodeSecret(secret.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Raw key material, for building an HMAC key.
    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for NodeSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NodeSecret(***)")
    }
}

impl<'de> Deserialize<'de> for NodeSecret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(NodeSecret)
    }
}
