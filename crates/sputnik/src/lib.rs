//! Server-to-server authentication for CloudKit Web Services.
//!
//! [`identity`] keeps the P-256 signing identity and its key ID on disk,
//! [`request`] turns an operation path, method and body into a
//! [`SignedRequest`] carrying the three CloudKit authentication headers.
//! Sending the request is left to the caller.

pub mod error;
pub mod identity;
pub mod request;

pub use error::{Result, SputnikError};
pub use identity::{IdentityManager, KeyManager, KeyStore, KeyStoreConfig};
pub use request::{Environment, RequestConfig, RequestManager, SignedRequest};

pub use http;
