//! Slack request signature verification using HMAC-SHA256.
//!
//! Slack signs each Events API request with the app's signing secret. The
//! signature covers `v0:<timestamp>:<raw body>` and arrives in the
//! `X-Slack-Signature` header as `v0=<hex>`, with the timestamp in
//! `X-Slack-Request-Timestamp`.
//!
//! Verification runs before the body is parsed. Requests whose timestamp is
//! more than [`SIGNATURE_TOLERANCE_SECS`] away from the local clock are
//! rejected to bound replays.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signature scheme version prefix.
pub const SIGNATURE_VERSION: &str = "v0";

/// Maximum accepted clock skew between Slack and this host (5 minutes).
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Parses an `X-Slack-Signature` header (e.g. "v0=abc123...") into raw bytes.
///
/// Returns `None` for malformed headers (missing prefix, invalid hex, etc.).
/// Never panics.
///
/// # Examples
///
/// ```
/// use dm_relay::webhooks::parse_signature_header;
///
/// assert!(parse_signature_header("v0=abcd1234").is_some());
/// assert!(parse_signature_header("abcd1234").is_none());
/// assert!(parse_signature_header("v1=abcd1234").is_none());
/// assert!(parse_signature_header("v0=xyz").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix("v0=")?;
    hex::decode(hex_sig).ok()
}

/// Computes the Slack signature of a request.
///
/// Returns `None` only if the secret cannot key an HMAC, which does not
/// happen for HMAC-SHA256 in practice.
pub fn compute_signature(timestamp: i64, body: &[u8], secret: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(signature_base(timestamp).as_bytes());
    mac.update(body);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Formats a signature as an `X-Slack-Signature` header value.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("{}={}", SIGNATURE_VERSION, hex::encode(signature))
}

/// Verifies a Slack request signature.
///
/// `timestamp_header` is the raw `X-Slack-Request-Timestamp` value and `now`
/// the current Unix time in seconds. Returns `true` only if the timestamp is
/// fresh and the signature matches. The comparison is constant time.
///
/// # Examples
///
/// ```
/// use dm_relay::webhooks::{compute_signature, format_signature_header, verify_signature};
///
/// let body = br#"{"type":"event_callback"}"#;
/// let secret = b"signing-secret";
/// let ts = 1_700_000_000;
///
/// let header = format_signature_header(&compute_signature(ts, body, secret).unwrap());
/// assert!(verify_signature(body, &ts.to_string(), &header, secret, ts));
/// assert!(!verify_signature(body, &ts.to_string(), &header, b"other", ts));
/// ```
pub fn verify_signature(
    body: &[u8],
    timestamp_header: &str,
    signature_header: &str,
    secret: &[u8],
    now: i64,
) -> bool {
    let timestamp = match timestamp_header.trim().parse::<i64>() {
        Ok(ts) => ts,
        Err(_) => return false,
    };

    if now.abs_diff(timestamp) > SIGNATURE_TOLERANCE_SECS.unsigned_abs() {
        return false;
    }

    let expected_signature = match parse_signature_header(signature_header) {
        Some(sig) => sig,
        None => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(signature_base(timestamp).as_bytes());
    mac.update(body);

    mac.verify_slice(&expected_signature).is_ok()
}

fn signature_base(timestamp: i64) -> String {
    format!("{}:{}:", SIGNATURE_VERSION, timestamp)
}
