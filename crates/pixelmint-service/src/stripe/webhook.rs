//! Webhook signature verification.
//!
//! Stripe signs `"{timestamp}.{raw body}"` with the endpoint secret and sends
//! `Stripe-Signature: t=<unix>,v1=<hex>[,v1=<hex>...]`. Any `v1` entry may
//! match; other schemes are ignored.

use crate::crypto::verify_hmac_sha256_hex;

use super::StripeError;

/// Maximum age (either direction) of a signed timestamp, in seconds.
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

/// Verify `payload` against a `Stripe-Signature` header at time `now`.
///
/// # Errors
///
/// - `StripeError::InvalidSignature` for a malformed header or no matching
///   `v1` signature.
/// - `StripeError::StaleTimestamp` when the signed timestamp is more than
///   [`WEBHOOK_TOLERANCE_SECS`] away from `now`.
pub fn verify_signature(
    payload: &str,
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), StripeError> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", ts)) => timestamp = Some(ts),
            Some(("v1", sig)) => signatures.push(sig),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(StripeError::InvalidSignature)?;
    let signed_at: i64 = timestamp
        .parse()
        .map_err(|_| StripeError::InvalidSignature)?;

    if signatures.is_empty() {
        return Err(StripeError::InvalidSignature);
    }

    let signed_payload = format!("{timestamp}.{payload}");
    if !signatures
        .iter()
        .any(|sig| verify_hmac_sha256_hex(secret, &signed_payload, sig))
    {
        return Err(StripeError::InvalidSignature);
    }

    if (now - signed_at).abs() > WEBHOOK_TOLERANCE_SECS {
        return Err(StripeError::StaleTimestamp);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hmac_sha256_hex;

    const SECRET: &str = "whsec_test";
    const BODY: &str = r#"{"id":"evt_1","type":"checkout.session.completed"}"#;
    const NOW: i64 = 1_700_000_000;

    fn header_for(ts: i64, body: &str) -> String {
        let sig = hmac_sha256_hex(SECRET, &format!("{ts}.{body}")).unwrap();
        format!("t={ts},v1={sig}")
    }

    #[test]
    fn accepts_valid_signature() {
        assert!(verify_signature(BODY, &header_for(NOW, BODY), SECRET, NOW).is_ok());
    }

    #[test]
    fn accepts_any_matching_v1() {
        let good = header_for(NOW, BODY);
        let good_sig = &good[good.find("v1=").unwrap()..];
        let header = format!("t={NOW},v1=deadbeef,v0=ignored,{good_sig}");
        assert!(verify_signature(BODY, &header, SECRET, NOW).is_ok());
    }

    #[test]
    fn rejects_modified_body() {
        let header = header_for(NOW, BODY);
        let tampered = BODY.replace("evt_1", "evt_2");
        assert!(matches!(
            verify_signature(&tampered, &header, SECRET, NOW),
            Err(StripeError::InvalidSignature)
        ));
    }

    #[test]
    fn rejects_wrong_secret() {
        let header = header_for(NOW, BODY);
        assert!(matches!(
            verify_signature(BODY, &header, "whsec_other", NOW),
            Err(StripeError::InvalidSignature)
        ));
    }

    #[test]
    fn rejects_malformed_headers() {
        let no_signature = format!("t={NOW}");
        for header in ["", "garbage", "t=abc,v1=00", no_signature.as_str()] {
            assert!(
                matches!(
                    verify_signature(BODY, header, SECRET, NOW),
                    Err(StripeError::InvalidSignature)
                ),
                "header {header:?} should be rejected"
            );
        }
    }

    #[test]
    fn enforces_tolerance() {
        let old = header_for(NOW - WEBHOOK_TOLERANCE_SECS - 1, BODY);
        assert!(matches!(
            verify_signature(BODY, &old, SECRET, NOW),
            Err(StripeError::StaleTimestamp)
        ));

        let edge = header_for(NOW - WEBHOOK_TOLERANCE_SECS, BODY);
        assert!(verify_signature(BODY, &edge, SECRET, NOW).is_ok());
    }
}
