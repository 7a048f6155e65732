use std::fmt;

use p256::ecdsa::{SigningKey, VerifyingKey};
use tracing::{debug, info, warn};

use super::KEY_ID_ENV;
use super::key_manager::KeyManager;
use super::store::{KeyStore, KeyStoreConfig};
use crate::error::{Result, SputnikError};

/// Owns the signing identity of one secrets folder and caches whatever has
/// been decoded from it.
///
/// Caches are filled on the first successful read and dropped by
/// [`KeyManager::remove_signing_identity`] and by identity re-creation.
pub struct IdentityManager {
    store: KeyStore,
    key_id_override: Option<String>,
    private_key: Option<SigningKey>,
    public_key: Option<VerifyingKey>,
    key_id: Option<String>,
}

impl IdentityManager {
    pub fn new(store: KeyStore) -> Self {
        Self {
            store,
            key_id_override: None,
            private_key: None,
            public_key: None,
            key_id: None,
        }
    }

    pub fn open(config: KeyStoreConfig) -> Self {
        Self::new(KeyStore::new(config))
    }

    /// Like [`IdentityManager::new`], honouring `SPUTNIK_CLOUDKIT_KEYID`.
    pub fn from_env(store: KeyStore) -> Self {
        Self::new(store).with_key_id_override(std::env::var(KEY_ID_ENV).ok())
    }

    /// Key ID that takes precedence over the stored one. Blank values are
    /// ignored.
    pub fn with_key_id_override(mut self, key_id: Option<String>) -> Self {
        self.key_id_override = key_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        self
    }

    pub fn store(&self) -> &KeyStore {
        &self.store
    }

    fn clear_cache(&mut self) {
        self.private_key = None;
        self.public_key = None;
        self.key_id = None;
    }

    /// The private key is authoritative. The derived artifact is only
    /// cross-checked, so a stale or orphaned DER is never served.
    fn resolve_public_key(&mut self) -> Result<VerifyingKey> {
        let public_key = *self.private_key()?.verifying_key();

        match self.store.read_derived_key() {
            Ok(derived) if *derived.verifying_key() == public_key => {}
            Ok(_) => warn!(
                path = %self.store.derived_key_path().display(),
                "derived key artifact does not match the private key; ignoring it"
            ),
            Err(SputnikError::MissingIdentity { .. }) => {}
            Err(e) => return Err(e),
        }

        Ok(public_key)
    }
}

impl KeyManager for IdentityManager {
    fn key_id(&mut self) -> Result<String> {
        if let Some(key_id) = &self.key_id_override {
            return Ok(key_id.clone());
        }
        if let Some(key_id) = &self.key_id {
            return Ok(key_id.clone());
        }

        let key_id = self.store.read_key_id()?;
        self.key_id = Some(key_id.clone());
        Ok(key_id)
    }

    fn private_key(&mut self) -> Result<&SigningKey> {
        let key = match self.private_key.take() {
            Some(key) => key,
            None => {
                let key = self.store.read_private_key()?;
                debug!(path = %self.store.private_key_path().display(), "loaded private key");
                key
            }
        };
        Ok(self.private_key.insert(key))
    }

    fn public_key(&mut self) -> Result<&VerifyingKey> {
        let key = match self.public_key.take() {
            Some(key) => key,
            None => self.resolve_public_key()?,
        };
        Ok(self.public_key.insert(key))
    }

    fn create_signing_identity(&mut self, overwrite: bool) -> Result<()> {
        if self.signing_identity_exists()? {
            if !overwrite {
                return Err(SputnikError::IdentityExists {
                    path: self.store.private_key_path(),
                });
            }
            info!("replacing the existing signing identity");
            self.remove_signing_identity()?;
        }

        self.clear_cache();
        self.store.generate_private_key()?;
        self.store.derive_public_artifact()?;
        info!(path = %self.store.config().secrets_dir.display(), "created signing identity");
        Ok(())
    }

    fn remove_signing_identity(&mut self) -> Result<()> {
        self.clear_cache();
        self.store.remove()
    }

    fn signing_identity_exists(&mut self) -> Result<bool> {
        self.store.exists()
    }

    fn store_key_id(&mut self, key_id: &str) -> Result<()> {
        let key_id = key_id.trim();
        self.store.write_key_id(key_id)?;
        self.key_id = Some(key_id.to_string());
        Ok(())
    }
}

impl fmt::Debug for IdentityManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityManager")
            .field("store", &self.store)
            .field("key_id_override", &self.key_id_override)
            .field("cached_private_key", &self.private_key.is_some())
            .field("cached_public_key", &self.public_key.is_some())
            .field("cached_key_id", &self.key_id)
            .finish()
    }
}
