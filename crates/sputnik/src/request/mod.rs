mod canonical;
mod config;
mod manager;
mod signed;

pub use canonical::{canonical_message, formatted_date, hashed_body};
pub use canonical::{sign_message, verify_signature};
pub use config::{DEFAULT_API_HOST, Environment, RequestConfig};
pub use manager::RequestManager;
pub use signed::{DATE_HEADER, KEY_ID_HEADER, SIGNATURE_HEADER};
pub use signed::{SignedRequest, SignedRequestHeaders};
