use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, SecondsFormat, Utc};
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::error::{Result, SputnikError};

/// RFC 3339 in UTC with second precision, e.g. `2017-01-02T15:04:05Z`.
pub fn formatted_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Base64 (standard alphabet, padded) of the SHA-256 of the body.
pub fn hashed_body(body: &str) -> String {
    STANDARD.encode(Sha256::digest(body.as_bytes()))
}

/// `date:hashed_body:path`. Colons inside the parts are not escaped; the
/// remote side joins the same way.
pub fn canonical_message(date: &str, hashed_body: &str, path: &str) -> String {
    [date, hashed_body, path].join(":")
}

/// DER-encoded ECDSA P-256 signature over the SHA-256 of `message`.
pub fn sign_message(key: &SigningKey, message: &[u8]) -> Result<Vec<u8>> {
    let digest = Sha256::digest(message);
    let signature: Signature = key
        .sign_prehash(&digest)
        .map_err(|e| SputnikError::Crypto(format!("P-256 sign_prehash failed: {e}")))?;
    Ok(signature.to_der().as_bytes().to_vec())
}

/// Checks a DER signature the way the remote service does.
pub fn verify_signature(key: &VerifyingKey, message: &[u8], signature: &[u8]) -> Result<()> {
    let signature = Signature::from_der(signature)
        .map_err(|e| SputnikError::Crypto(format!("malformed signature: {e}")))?;
    key.verify_prehash(&Sha256::digest(message), &signature)
        .map_err(|e| SputnikError::Crypto(format!("signature does not verify: {e}")))
}
