//! Capability descriptor consumed by upper layers to decide whether to call
//! `thumb`/`media_meta` on a driver, and whether to proxy the work.

use serde::Serialize;

/// Optional driver behaviours advertised through the static feature set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Feature {
    /// Content must be relayed through the master instead of redirected to.
    ProxyRequired = 0,
    /// Files can be read directly from the local disk.
    InboundGet = 1,
    /// Uploads need a placeholder entity until the callback arrives.
    UploadSentinelRequired = 2,
}

/// Immutable set of [`Feature`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct FeatureSet(u64);

impl FeatureSet {
    pub const fn empty() -> Self {
        FeatureSet(0)
    }

    pub const fn with(self, feature: Feature) -> Self {
        FeatureSet(self.0 | (1 << feature as u8))
    }

    pub const fn enabled(&self, feature: Feature) -> bool {
        self.0 & (1 << feature as u8) != 0
    }

    pub const fn bits(&self) -> u64 {
        self.0
    }
}

/// Per-policy capability snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub static_features: FeatureSet,
    pub media_meta_supported_exts: Vec<String>,
    pub media_meta_proxy: bool,
    pub thumb_supported_exts: Vec<String>,
    pub thumb_proxy: bool,
    pub thumb_max_size: u64,
    pub thumb_support_all_exts: bool,
}

impl Capabilities {
    pub fn supports_thumb(&self, ext: &str, size: u64) -> bool {
        if self.thumb_max_size > 0 && size > self.thumb_max_size {
            return false;
        }
        self.thumb_support_all_exts || contains_ext(&self.thumb_supported_exts, ext)
    }

    pub fn supports_media_meta(&self, ext: &str) -> bool {
        contains_ext(&self.media_meta_supported_exts, ext)
    }
}

fn contains_ext(exts: &[String], ext: &str) -> bool {
    let ext = ext.trim_start_matches('.');
    exts.iter().any(|e| e.eq_ignore_ascii_case(ext))
}
