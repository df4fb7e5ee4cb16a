//! Webhook signatures: header `t=<unix seconds>,v1=<hex hmac>[,v1=..]`, where each `v1` is
//! HMAC-SHA256 over `"{t}.{payload}"` keyed with the endpoint secret.

use super::error::WebhookError;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<SignatureHeader, WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let (key, value) = part
            .split_once('=')
            .ok_or(WebhookError::InvalidSignature)?;
        match key.trim() {
            "t" => timestamp = value.trim().parse::<i64>().ok(),
            "v1" => {
                // undecodable candidates can never match; skip them
                if let Ok(bytes) = hex::decode(value.trim()) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    match timestamp {
        Some(timestamp) if !signatures.is_empty() => Ok(SignatureHeader {
            timestamp,
            signatures,
        }),
        _ => Err(WebhookError::InvalidSignature),
    }
}

fn mac(secret: &str, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Checks `header` against `payload`. Runs before the payload is parsed at all.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
    now: DateTime<Utc>,
) -> Result<(), WebhookError> {
    if secret.is_empty() {
        return Err(WebhookError::MissingSecret);
    }
    let parsed = parse_header(header)?;

    // the timestamp is still untrusted here
    let age_secs = now.timestamp().saturating_sub(parsed.timestamp);
    if age_secs.unsigned_abs() > tolerance.as_secs() {
        return Err(WebhookError::TimestampOutOfTolerance { age_secs });
    }

    let expected = mac(secret, parsed.timestamp, payload)?;
    let matched = parsed
        .signatures
        .iter()
        .any(|candidate| bool::from(expected.as_slice().ct_eq(candidate.as_slice())));
    if matched {
        Ok(())
    } else {
        Err(WebhookError::InvalidSignature)
    }
}

/// Builds a header for `payload`, as the billing provider would send it.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let signature = mac(secret, timestamp, payload)
        .map(hex::encode)
        .unwrap_or_default();
    format!("t={timestamp},v1={signature}")
}
