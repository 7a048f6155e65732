use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use p256::SecretKey;
use p256::ecdsa::SigningKey;
use p256::pkcs8::LineEnding;
use rand_core::OsRng;
use tracing::{debug, info, warn};

use crate::error::{Result, SputnikError};

pub const DEFAULT_PRIVATE_KEY_FILE: &str = "eckey.pem";
pub const DEFAULT_DERIVED_KEY_FILE: &str = "cert.der";
pub const DEFAULT_KEY_ID_FILE: &str = "keyid.txt";

/// Location of the signing identity on disk.
///
/// The default lives under `$HOME/.sputnik/secrets`; tests and embedders
/// inject their own directory with [`KeyStoreConfig::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStoreConfig {
    pub secrets_dir: PathBuf,
    pub private_key_file: String,
    pub derived_key_file: String,
    pub key_id_file: String,
}

impl KeyStoreConfig {
    pub fn new(secrets_dir: impl Into<PathBuf>) -> Self {
        Self {
            secrets_dir: secrets_dir.into(),
            private_key_file: DEFAULT_PRIVATE_KEY_FILE.to_string(),
            derived_key_file: DEFAULT_DERIVED_KEY_FILE.to_string(),
            key_id_file: DEFAULT_KEY_ID_FILE.to_string(),
        }
    }

    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            SputnikError::storage(
                "~/.sputnik/secrets",
                io::Error::new(io::ErrorKind::NotFound, "could not determine the home directory"),
            )
        })?;
        Ok(Self::new(home.join(".sputnik").join("secrets")))
    }

    pub fn with_private_key_file(mut self, name: impl Into<String>) -> Self {
        self.private_key_file = name.into();
        self
    }

    pub fn with_derived_key_file(mut self, name: impl Into<String>) -> Self {
        self.derived_key_file = name.into();
        self
    }

    pub fn with_key_id_file(mut self, name: impl Into<String>) -> Self {
        self.key_id_file = name.into();
        self
    }
}

/// Durable storage for the three artifacts of a signing identity: the PEM
/// private key, its DER derivation and the key ID issued by the dashboard.
///
/// Every call opens and closes its own file handles.
#[derive(Debug, Clone)]
pub struct KeyStore {
    config: KeyStoreConfig,
}

impl KeyStore {
    pub fn new(config: KeyStoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KeyStoreConfig {
        &self.config
    }

    pub fn private_key_path(&self) -> PathBuf {
        self.config.secrets_dir.join(&self.config.private_key_file)
    }

    pub fn derived_key_path(&self) -> PathBuf {
        self.config.secrets_dir.join(&self.config.derived_key_file)
    }

    pub fn key_id_path(&self) -> PathBuf {
        self.config.secrets_dir.join(&self.config.key_id_file)
    }

    /// Returns the secrets directory, creating it owner-only if missing.
    pub fn secrets_folder(&self) -> Result<PathBuf> {
        let dir = &self.config.secrets_dir;
        if dir.is_dir() {
            return Ok(dir.clone());
        }

        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        match builder.create(dir) {
            Ok(()) => {
                info!(path = %dir.display(), "created secrets folder");
                Ok(dir.clone())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(dir.clone()),
            Err(e) => Err(SputnikError::storage(dir, e)),
        }
    }

    /// Whether the private key is present and can be opened.
    pub fn exists(&self) -> Result<bool> {
        let path = self.private_key_path();
        match File::open(&path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SputnikError::storage(path, e)),
        }
    }

    /// Generates a fresh P-256 key and writes it as SEC1 PEM, replacing any
    /// key already at that path.
    pub fn generate_private_key(&self) -> Result<()> {
        self.secrets_folder()?;
        let secret = SecretKey::random(&mut OsRng);
        let pem = secret
            .to_sec1_pem(LineEnding::LF)
            .map_err(|e| SputnikError::Crypto(format!("encoding private key as PEM: {e}")))?;

        let path = self.private_key_path();
        write_owner_only(&path, pem.as_bytes())?;
        info!(path = %path.display(), "generated P-256 private key");

        // The DER of the previous key no longer describes this identity.
        let derived = self.derived_key_path();
        match fs::remove_file(&derived) {
            Ok(()) => debug!(path = %derived.display(), "dropped stale derived key artifact"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(SputnikError::storage(derived, e)),
        }
        Ok(())
    }

    /// Persists the SEC1 DER encoding of the stored private key.
    pub fn derive_public_artifact(&self) -> Result<()> {
        self.secrets_folder()?;
        let key = self.read_private_key()?;
        let der = SecretKey::from(&key)
            .to_sec1_der()
            .map_err(|e| SputnikError::Crypto(format!("encoding private key as DER: {e}")))?;

        let path = self.derived_key_path();
        write_owner_only(&path, &der)?;
        debug!(path = %path.display(), "wrote derived key artifact");
        Ok(())
    }

    pub fn read_private_key(&self) -> Result<SigningKey> {
        let path = self.private_key_path();
        let pem = read_artifact(&path, || SputnikError::MissingIdentity { path: path.clone() })?;
        let pem = String::from_utf8(pem).map_err(|e| SputnikError::parse(&path, e))?;
        let secret = SecretKey::from_sec1_pem(&pem).map_err(|e| SputnikError::parse(&path, e))?;
        Ok(SigningKey::from(secret))
    }

    /// Decodes the DER artifact. Keys on any curve other than P-256 are
    /// rejected by the SEC1 curve parameters check.
    pub fn read_derived_key(&self) -> Result<SigningKey> {
        let path = self.derived_key_path();
        let der = read_artifact(&path, || SputnikError::MissingIdentity { path: path.clone() })?;
        let secret = SecretKey::from_sec1_der(&der).map_err(|e| SputnikError::parse(&path, e))?;
        Ok(SigningKey::from(secret))
    }

    pub fn read_key_id(&self) -> Result<String> {
        let path = self.key_id_path();
        let missing = || SputnikError::MissingKeyId { path: path.clone() };
        let raw = read_artifact(&path, missing)?;
        let key_id = String::from_utf8(raw).map_err(|e| SputnikError::parse(&path, e))?;
        let key_id = key_id.trim();
        if key_id.is_empty() {
            return Err(missing());
        }
        Ok(key_id.to_string())
    }

    /// Stores the trimmed key ID. Blank IDs are rejected.
    pub fn write_key_id(&self, key_id: &str) -> Result<()> {
        let key_id = key_id.trim();
        if key_id.is_empty() {
            return Err(SputnikError::BlankKeyId);
        }
        self.secrets_folder()?;
        let path = self.key_id_path();
        fs::write(&path, key_id).map_err(|e| SputnikError::storage(&path, e))?;
        debug!(path = %path.display(), "stored key id");
        Ok(())
    }

    /// Deletes all three artifacts. Every deletion is attempted; artifacts
    /// that are already gone count as removed. The private key goes last, so
    /// the identity keeps counting as present until nothing else is left.
    pub fn remove(&self) -> Result<()> {
        let failures: Vec<SputnikError> = [
            self.derived_key_path(),
            self.key_id_path(),
            self.private_key_path(),
        ]
        .into_iter()
        .filter_map(|path| match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed");
                None
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove identity artifact");
                Some(SputnikError::storage(path, e))
            }
        })
        .collect();

        if failures.is_empty() {
            info!(path = %self.config.secrets_dir.display(), "removed signing identity");
            Ok(())
        } else {
            Err(SputnikError::Removal(failures))
        }
    }
}

fn read_artifact(path: &Path, missing: impl FnOnce() -> SputnikError) -> Result<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(missing()),
        Err(e) => Err(SputnikError::storage(path, e)),
    }
}

fn write_owner_only(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| SputnikError::storage(path, e))?;
    file.write_all(contents)
        .and_then(|()| file.sync_all())
        .map_err(|e| SputnikError::storage(path, e))?;

    // `mode` only applies on creation; tighten a pre-existing file as well.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .map_err(|e| SputnikError::storage(path, e))?;
    }

    Ok(())
}
