mod key_manager;
mod manager;
mod store;

pub use key_manager::KeyManager;
pub use manager::IdentityManager;
pub use store::{
    DEFAULT_DERIVED_KEY_FILE, DEFAULT_KEY_ID_FILE, DEFAULT_PRIVATE_KEY_FILE, KeyStore,
    KeyStoreConfig,
};

use p256::ecdsa::VerifyingKey;
use p256::pkcs8::{EncodePublicKey, LineEnding};
use sha2::{Digest, Sha256};

use crate::error::{Result, SputnikError};

/// Environment variable that overrides the stored key ID.
pub const KEY_ID_ENV: &str = "SPUTNIK_CLOUDKIT_KEYID";

/// SPKI PEM of the public key, the form the dashboard asks for when a new
/// server-to-server key is registered.
pub fn public_key_pem(key: &VerifyingKey) -> Result<String> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| SputnikError::Crypto(format!("encoding public key as PEM: {e}")))
}

/// Hex SHA-256 over the uncompressed SEC1 point.
pub fn fingerprint(key: &VerifyingKey) -> String {
    hex::encode(Sha256::digest(key.to_encoded_point(false).as_bytes()))
}
