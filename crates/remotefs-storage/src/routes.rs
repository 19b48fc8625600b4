//! URL builders for slave endpoints and the master's upload callback.
//!
//! Physical paths are embedded as URL-safe base64 so that slashes and
//! non-ASCII names survive as a single path segment.

use base64::Engine;
use url::Url;

use crate::PolicyType;

const API_PREFIX: [&str; 2] = ["api", "v4"];

fn encode_source(source: &str) -> String {
    base64::engine::general_purpose::URL_SAFE.encode(source.as_bytes())
}

/// `base` with its query and fragment dropped and `segments` appended to its path.
///
/// `base` must be able to carry a path (`http(s)://host[/prefix]`); for other
/// URLs the path is left untouched.
fn with_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty();
        path.extend(API_PREFIX);
        path.extend(segments);
    }
    url
}

pub fn slave_thumb_url(base: &Url, source: &str, ext: &str) -> Url {
    with_segments(base, &["slave", "thumb", &encode_source(source), ext])
}

/// Content endpoint of a slave.
///
/// `node_id` is non-zero only when the URL is built by a slave for itself, so
/// the serving node does not redirect to another node.
pub fn slave_file_content_url(
    base: &Url,
    source: &str,
    display_name: &str,
    is_download: bool,
    speed: u64,
    node_id: i64,
) -> Url {
    let node_id = node_id.to_string();
    let speed = speed.to_string();
    let mut url = with_segments(
        base,
        &[
            "slave",
            "file",
            "content",
            &node_id,
            &encode_source(source),
            &speed,
            display_name,
        ],
    );
    if is_download {
        url.query_pairs_mut().append_pair("download", "true");
    }
    url
}

/// Callback the slave invokes once an upload session is fully received.
pub fn master_slave_callback_url(
    site: &Url,
    policy_type: PolicyType,
    session_id: &str,
    callback_secret: &str,
) -> Url {
    with_segments(
        site,
        &["callback", policy_type.as_str(), session_id, callback_secret],
    )
}

pub fn slave_list_url(base: &Url, path: &str, recursive: bool) -> Url {
    let mut url = with_segments(base, &["slave", "list"]);
    url.query_pairs_mut()
        .append_pair("path", path)
        .append_pair("recursive", if recursive { "true" } else { "false" });
    url
}

pub fn slave_file_url(base: &Url, path: &str, overwrite: bool) -> Url {
    let mut url = with_segments(base, &["slave", "file"]);
    url.query_pairs_mut()
        .append_pair("path", path)
        .append_pair("overwrite", if overwrite { "true" } else { "false" });
    url
}

pub fn slave_delete_url(base: &Url) -> Url {
    with_segments(base, &["slave", "delete"])
}

/// Endpoint creating upload sessions.
pub fn slave_upload_session_url(base: &Url) -> Url {
    with_segments(base, &["slave", "upload"])
}

/// Endpoint receiving chunks of, or deleting, one upload session.
pub fn slave_upload_url(base: &Url, session_id: &str) -> Url {
    with_segments(base, &["slave", "upload", session_id])
}

pub fn slave_media_meta_url(base: &Url, source: &str, ext: &str) -> Url {
    with_segments(base, &["slave", "meta", &encode_source(source), ext])
}
