use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::identity::KEY_ID_ENV;

pub type Result<T, E = SputnikError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum SputnikError {
    #[error("Storage failure at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse P-256 key from {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },
    #[error("No signing identity found at {}. Create one with `sputnik identity create`", .path.display())]
    MissingIdentity { path: PathBuf },
    #[error(
        "No key ID found at {}. Store one with `sputnik keyid store <key id>` or set {}",
        .path.display(),
        KEY_ID_ENV
    )]
    MissingKeyId { path: PathBuf },
    #[error("Refusing to sign without a private key")]
    Signing(#[source] Box<SputnikError>),
    #[error("Cryptographic failure: {0}")]
    Crypto(String),
    #[error(
        "A signing identity already exists at {}. Remove it with `sputnik identity remove` first",
        .path.display()
    )]
    IdentityExists { path: PathBuf },
    #[error("Key ID must not be blank")]
    BlankKeyId,
    #[error("Failed to remove the signing identity: {}", RemovalFailures(.0))]
    Removal(Vec<SputnikError>),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl SputnikError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True when the error only means the identity (or its key ID) has not
    /// been set up yet, as opposed to a broken store.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::MissingIdentity { .. } | Self::MissingKeyId { .. })
    }
}

struct RemovalFailures<'a>(&'a [SputnikError]);

impl fmt::Display for RemovalFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl From<http::Error> for SputnikError {
    fn from(error: http::Error) -> Self {
        Self::InvalidRequest(error.to_string())
    }
}
