//! Request signatures: <https://api.slack.com/authentication/verifying-requests-from-slack>

use std::time::{SystemTime, UNIX_EPOCH};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::trace;

use crate::webhooks::Invocation;

pub const X_SLACK_SIGNATURE: &str = "X-Slack-Signature";
pub const X_SLACK_REQUEST_TIMESTAMP: &str = "X-Slack-Request-Timestamp";

const VERSION: &str = "v0";
/// Requests signed further away from now than this are refused, to limit replays.
const MAX_CLOCK_SKEW_SECS: u64 = 60 * 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("request needs exactly one {0} header")]
    MissingHeader(&'static str),
    #[error("invalid request timestamp")]
    InvalidTimestamp,
    #[error("request timestamp is too far from the current time")]
    StaleTimestamp,
    #[error("couldn't verify signature")]
    Mismatch,
}

/// Checks the signature headers of `invocation` against its decoded `body`.
pub fn verify_invocation(
    secret: &SecretString,
    invocation: &dyn Invocation,
    body: &str,
) -> Result<(), SignatureError> {
    let timestamp = invocation
        .header(X_SLACK_REQUEST_TIMESTAMP)
        .ok_or(SignatureError::MissingHeader(X_SLACK_REQUEST_TIMESTAMP))?;
    let signature = invocation
        .header(X_SLACK_SIGNATURE)
        .ok_or(SignatureError::MissingHeader(X_SLACK_SIGNATURE))?;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();

    validate_signature(secret.expose_secret(), timestamp, signature, body, now)
}

fn validate_signature(
    secret: &str,
    timestamp: &str,
    signature: &str,
    body: &str,
    now: u64,
) -> Result<(), SignatureError> {
    trace!("validating signature...");
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let sent_at: u64 = timestamp
        .trim()
        .parse()
        .map_err(|_| SignatureError::InvalidTimestamp)?;
    if now.abs_diff(sent_at) > MAX_CLOCK_SKEW_SECS {
        trace!("timestamp {} is too far from {}", sent_at, now);
        return Err(SignatureError::StaleTimestamp);
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take a key of any size");
    mac.update(format!("{}:{}:{}", VERSION, timestamp, body).as_bytes());

    // Slack puts the version in front of its hex SHA256
    let signature = match signature.strip_prefix("v0=") {
        Some(s) => s,
        None => {
            trace!("couldn't strip prefix from signature `{}`", signature);
            return Err(SignatureError::Mismatch);
        }
    };

    match hex::decode(signature) {
        Ok(bytes) => mac
            .verify_slice(&bytes)
            .map_err(|_| SignatureError::Mismatch),
        Err(_) => {
            trace!("couldn't decode hex-encoded signature {}", signature);
            Err(SignatureError::Mismatch)
        }
    }
}
