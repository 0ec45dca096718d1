//! HMAC helpers for webhook signatures.

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 of `message` and return it hex-encoded.
///
/// # Errors
///
/// Returns `InvalidLength` if the key is rejected. HMAC accepts keys of any
/// size, so this only happens if the implementation is broken.
pub fn hmac_sha256_hex(secret: &str, message: &str) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a hex-encoded HMAC-SHA256 signature in constant time.
///
/// Malformed hex never matches.
#[must_use]
pub fn verify_hmac_sha256_hex(secret: &str, message: &str, signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(message.as_bytes());
    mac.verify_slice(&signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_rfc_4231_case_2() {
        let sig = hmac_sha256_hex("Jefe", "what do ya want for nothing?").unwrap();
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn verifies_own_signature() {
        let sig = hmac_sha256_hex("whsec_test", "123.{}").unwrap();
        assert!(verify_hmac_sha256_hex("whsec_test", "123.{}", &sig));
    }

    #[test]
    fn rejects_tampering() {
        let sig = hmac_sha256_hex("whsec_test", "123.{}").unwrap();
        assert!(!verify_hmac_sha256_hex("whsec_test", "124.{}", &sig));
        assert!(!verify_hmac_sha256_hex("whsec_other", "123.{}", &sig));
        assert!(!verify_hmac_sha256_hex("whsec_test", "123.{}", "not-hex"));
        assert!(!verify_hmac_sha256_hex("whsec_test", "123.{}", &sig[..10]));
    }
}
