//! Content-security policy for the preview document

use crate::nonce::Nonce;

/// Origin of the CDN that serves p5.js
pub const DEFAULT_CDN_ORIGIN: &str = "https://cdn.jsdelivr.net";

/// Build the policy string for one rendered document
///
/// `csp_source` is the panel's own resource origin as reported by the host.
/// Everything is denied by default; script and style need the nonce, with the
/// CDN origin as the only other script source.
pub fn content_security_policy(csp_source: &str, nonce: &Nonce, cdn_origin: &str) -> String {
    let source = csp_source.trim();
    let with_source = |rest: &str| {
        if source.is_empty() {
            rest.to_string()
        } else {
            format!("{source} {rest}")
        }
    };

    [
        "default-src 'none'".to_string(),
        format!("img-src {}", with_source("https: data:")),
        format!("script-src 'nonce-{nonce}' {}", cdn_origin.trim()),
        format!("style-src 'nonce-{nonce}'"),
        "connect-src https:".to_string(),
        format!("font-src {}", with_source("https: data:")),
    ]
    .join("; ")
        + ";"
}
