use p256::ecdsa::{SigningKey, VerifyingKey};

use crate::error::Result;

/// Capability surface the request signer relies on.
///
/// Methods take `&mut self` so implementations can cache decoded key
/// material; the cache lives in exactly one place and is never copied.
pub trait KeyManager {
    /// Resolves the key ID bound to the public key in the dashboard.
    fn key_id(&mut self) -> Result<String>;

    fn private_key(&mut self) -> Result<&SigningKey>;

    fn public_key(&mut self) -> Result<&VerifyingKey>;

    /// Creates a new identity. Fails with `IdentityExists` when one is
    /// already present unless `overwrite` is set.
    fn create_signing_identity(&mut self, overwrite: bool) -> Result<()>;

    fn remove_signing_identity(&mut self) -> Result<()>;

    fn signing_identity_exists(&mut self) -> Result<bool>;

    fn store_key_id(&mut self, key_id: &str) -> Result<()>;
}

impl<K: KeyManager + ?Sized> KeyManager for &mut K {
    fn key_id(&mut self) -> Result<String> {
        (**self).key_id()
    }

    fn private_key(&mut self) -> Result<&SigningKey> {
        (**self).private_key()
    }

    fn public_key(&mut self) -> Result<&VerifyingKey> {
        (**self).public_key()
    }

    fn create_signing_identity(&mut self, overwrite: bool) -> Result<()> {
        (**self).create_signing_identity(overwrite)
    }

    fn remove_signing_identity(&mut self) -> Result<()> {
        (**self).remove_signing_identity()
    }

    fn signing_identity_exists(&mut self) -> Result<bool> {
        (**self).signing_identity_exists()
    }

    fn store_key_id(&mut self, key_id: &str) -> Result<()> {
        (**self).store_key_id(key_id)
    }
}
