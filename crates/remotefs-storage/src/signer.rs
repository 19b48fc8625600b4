//! HMAC-SHA256 signing of slave URLs and RPCs.

use crate::traits::{StorageError, StorageResult};
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use remotefs_core::NodeSecret;
use sha2::Sha256;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// Query parameter carrying the signature.
pub const SIGN_PARAM: &str = "sign";

/// Signs with the shared secret of one node.
///
/// Signing is a pure function of (payload, expiry, secret); the signer holds no
/// mutable state and can be shared freely between tasks.
#[derive(Clone, Debug)]
pub struct HmacSigner {
    secret: NodeSecret,
}

impl HmacSigner {
    pub fn new(secret: NodeSecret) -> Self {
        Self { secret }
    }

    /// Sign `payload`, returning `<base64url(mac)>:<expires>`.
    ///
    /// A missing expiry is encoded as `0`; the slave decides how long such a
    /// signature stays valid.
    pub fn sign_payload(
        &self,
        payload: &str,
        expires: Option<DateTime<Utc>>,
    ) -> StorageResult<String> {
        if self.secret.is_empty() {
            return Err(StorageError::Signing(
                "node secret is empty or unset".to_string(),
            ));
        }
        let expires = expires.map(|t| t.timestamp()).unwrap_or(0);

        let mut mac = HmacSha256::new_from_slice(self.secret.expose())
            .map_err(|e| StorageError::Signing(format!("Invalid HMAC key: {}", e)))?;
        mac.update(payload.as_bytes());
        mac.update(b":");
        mac.update(expires.to_string().as_bytes());
        let tag = mac.finalize().into_bytes();

        Ok(format!(
            "{}:{}",
            base64::engine::general_purpose::URL_SAFE.encode(tag),
            expires
        ))
    }

    /// Append a signature over the path of `raw_url` to its query string.
    ///
    /// Any `sign` parameter already present is replaced; other parameters are kept.
    pub fn sign_uri(&self, raw_url: &str, expires: Option<DateTime<Utc>>) -> StorageResult<Url> {
        let mut url = Url::parse(raw_url)
            .map_err(|e| StorageError::Signing(format!("invalid URL {}: {}", raw_url, e)))?;
        if url.cannot_be_a_base() {
            return Err(StorageError::Signing(format!(
                "URL {} has no path to sign",
                raw_url
            )));
        }

        let signature = self.sign_payload(url.path(), expires)?;
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != SIGN_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair(SIGN_PARAM, &signature);

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn signer(secret: &str) -> HmacSigner {
        HmacSigner::new(NodeSecret::new(secret))
    }

    fn sign_of(url: &Url) -> String {
        url.query_pairs()
            .find(|(k, _)| k == SIGN_PARAM)
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[test]
    fn signing_is_deterministic() {
        let s = signer("secret");
        let expiry = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let a = s.sign_uri("https://slave.example.com/api/v4/slave/thumb/abc/jpg", Some(expiry));
        let b = s.sign_uri("https://slave.example.com/api/v4/slave/thumb/abc/jpg", Some(expiry));
        assert_eq!(a.unwrap().as_str(), b.unwrap().as_str());

        let c = signer("secret").sign_uri("https://slave.example.com/x", None).unwrap();
        let d = signer("secret").sign_uri("https://slave.example.com/x", None).unwrap();
        assert_eq!(c, d);
    }

    #[test]
    fn signature_matches_hmac_of_path_and_expiry() {
        let s = signer("secret");
        let expiry = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let url = s
            .sign_uri("https://slave.example.com/a/b?x=1", Some(expiry))
            .unwrap();

        let mut mac = HmacSha256::new_from_slice(b"secret").unwrap();
        mac.update(format!("/a/b:{}", expiry.timestamp()).as_bytes());
        let expected = format!(
            "{}:{}",
            base64::engine::general_purpose::URL_SAFE.encode(mac.finalize().into_bytes()),
            expiry.timestamp()
        );

        assert_eq!(sign_of(&url), expected);
        assert!(url.query_pairs().any(|(k, v)| k == "x" && v == "1"));
    }

    #[test]
    fn missing_expiry_is_encoded_as_zero() {
        let url = signer("secret").sign_uri("https://s/p", None).unwrap();
        assert!(sign_of(&url).ends_with(":0"));
    }

    #[test]
    fn different_secrets_give_different_signatures() {
        let a = signer("one").sign_payload("/p", None).unwrap();
        let b = signer("two").sign_payload("/p", None).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn existing_sign_param_is_replaced() {
        let url = signer("secret")
            .sign_uri("https://s/p?sign=forged&download=true", None)
            .unwrap();
        let signs: Vec<_> = url.query_pairs().filter(|(k, _)| k == SIGN_PARAM).collect();
        assert_eq!(signs.len(), 1);
        assert_ne!(signs[0].1, "forged");
        assert!(url.query_pairs().any(|(k, _)| k == "download"));
    }

    #[test]
    fn secret_never_appears_in_output() {
        let url = signer("very-secret-value")
            .sign_uri("https://s/p", None)
            .unwrap();
        assert!(!url.as_str().contains("very-secret-value"));
    }

    #[test]
    fn invalid_url_is_a_signing_error() {
        let err = signer("secret").sign_uri("not a url", None).unwrap_err();
        assert!(matches!(err, StorageError::Signing(_)));

        let err = signer("secret").sign_uri("mailto:a@b.c", None).unwrap_err();
        assert!(matches!(err, StorageError::Signing(_)));
    }

    #[test]
    fn empty_secret_is_rejected() {
        let signer = HmacSigner::new(NodeSecret::new(""));
        let err = signer.sign_uri("https://s/p", None).unwrap_err();
        assert!(matches!(err, StorageError::Signing(_)));
        assert!(signer.sign_payload("/p", None).is_err());
    }
}
