use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use http::{Method, Uri};
use tracing::debug;

use super::canonical::{canonical_message, formatted_date, hashed_body, sign_message};
use super::config::RequestConfig;
use super::signed::{SignedRequest, SignedRequestHeaders};
use crate::error::{Result, SputnikError};
use crate::identity::KeyManager;

/// Builds signed requests for one container and database.
///
/// Holds the key manager by value; pass `&mut manager` to keep ownership of
/// an [`IdentityManager`](crate::identity::IdentityManager) elsewhere.
#[derive(Debug)]
pub struct RequestManager<K> {
    config: RequestConfig,
    key_manager: K,
}

impl<K: KeyManager> RequestManager<K> {
    pub fn new(config: RequestConfig, key_manager: K) -> Self {
        Self {
            config,
            key_manager,
        }
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    pub fn key_manager(&mut self) -> &mut K {
        &mut self.key_manager
    }

    pub fn into_key_manager(self) -> K {
        self.key_manager
    }

    /// Signs a request for `operation_path` (e.g. `records/modify`) at the
    /// current time.
    pub fn build_request(
        &mut self,
        operation_path: &str,
        method: Method,
        body: &str,
    ) -> Result<SignedRequest> {
        self.build_request_at(operation_path, method, body, Utc::now())
    }

    pub fn build_request_at(
        &mut self,
        operation_path: &str,
        method: Method,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<SignedRequest> {
        let key_id = self.key_manager.key_id()?;
        let date = formatted_date(now);
        let hashed_body = hashed_body(body);
        let full_path = self.config.full_path(operation_path);

        let message = canonical_message(&date, &hashed_body, &full_path);
        debug!(date = %date, hashed_body = %hashed_body, path = %full_path, "canonical message");

        let signature = STANDARD.encode(self.signature_for_message(message.as_bytes())?);

        let url = self.config.url(operation_path);
        let uri: Uri = url
            .parse()
            .map_err(|e| SputnikError::InvalidRequest(format!("{url}: {e}")))?;
        debug!(%method, url = %uri, "signed request");

        Ok(SignedRequest {
            method,
            uri,
            body: body.as_bytes().to_vec(),
            headers: SignedRequestHeaders {
                key_id,
                date,
                signature,
            },
        })
    }

    pub fn post_request(&mut self, operation_path: &str, body: &str) -> Result<SignedRequest> {
        self.build_request(operation_path, Method::POST, body)
    }

    pub fn get_request(&mut self, operation_path: &str) -> Result<SignedRequest> {
        self.build_request(operation_path, Method::GET, "")
    }

    /// DER ECDSA signature of `message` with the managed private key.
    pub fn signature_for_message(&mut self, message: &[u8]) -> Result<Vec<u8>> {
        let key = self.key_manager.private_key().map_err(|e| match e {
            e @ SputnikError::MissingIdentity { .. } => SputnikError::Signing(Box::new(e)),
            other => other,
        })?;
        sign_message(key, message)
    }
}
