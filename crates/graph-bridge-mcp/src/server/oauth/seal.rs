//! Signed blobs for state round trips and approval cookies.
//!
//! Anything that leaves the server and comes back through a browser is sealed
//! as `{base64url(payload)}.{base64url(tag)}`, where the tag is HMAC-SHA256
//! over the payload bytes. Verification failures are indistinguishable from
//! absence: callers get `None` and treat the value as never having existed.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Serialize, de::DeserializeOwned};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Seal a value under the given secret.
///
/// # Errors
///
/// Returns error if the value cannot be serialized.
pub fn seal<T: Serialize>(secret: &str, value: &T) -> Result<String, serde_json::Error> {
    let payload = serde_json::to_vec(value)?;
    let tag = sign(secret, &payload);
    Ok(format!("{}.{}", URL_SAFE_NO_PAD.encode(&payload), URL_SAFE_NO_PAD.encode(tag)))
}

/// Open a sealed value. Returns `None` on any malformation, signature
/// mismatch, or decode failure.
#[must_use]
pub fn unseal<T: DeserializeOwned>(secret: &str, sealed: &str) -> Option<T> {
    let (payload_b64, tag_b64) = sealed.split_once('.')?;
    let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
    let tag = URL_SAFE_NO_PAD.decode(tag_b64).ok()?;

    let mut mac = new_mac(secret);
    mac.update(&payload);
    // Constant-time comparison
    mac.verify_slice(&tag).ok()?;

    serde_json::from_slice(&payload).ok()
}

fn sign(secret: &str, payload: &[u8]) -> Vec<u8> {
    let mut mac = new_mac(secret);
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

fn new_mac(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-signing-secret";

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Payload {
        client_id: String,
        nonce: u32,
    }

    fn payload() -> Payload {
        Payload { client_id: "c1".to_string(), nonce: 7 }
    }

    #[test]
    fn test_seal_unseal_roundtrip() {
        let sealed = seal(SECRET, &payload()).unwrap();
        let opened: Payload = unseal(SECRET, &sealed).unwrap();
        assert_eq!(opened, payload());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let sealed = seal(SECRET, &payload()).unwrap();
        let (_, tag) = sealed.split_once('.').unwrap();

        let forged_payload =
            URL_SAFE_NO_PAD.encode(br#"{"client_id": "attacker", "nonce": 7}"#);
        let forged = format!("{forged_payload}.{tag}");

        assert!(unseal::<Payload>(SECRET, &forged).is_none());
    }

    #[test]
    fn test_tampered_tag_rejected() {
        let sealed = seal(SECRET, &payload()).unwrap();
        let (body, _) = sealed.split_once('.').unwrap();
        let forged = format!("{body}.{}", URL_SAFE_NO_PAD.encode(b"not-a-real-tag"));

        assert!(unseal::<Payload>(SECRET, &forged).is_none());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let sealed = seal(SECRET, &payload()).unwrap();
        assert!(unseal::<Payload>("different-secret", &sealed).is_none());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(unseal::<Payload>(SECRET, "").is_none());
        assert!(unseal::<Payload>(SECRET, "no-dot-here").is_none());
        assert!(unseal::<Payload>(SECRET, "!!!.???").is_none());
    }
}
