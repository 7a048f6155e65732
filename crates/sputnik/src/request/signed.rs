use http::{Method, Uri};

use crate::error::{Result, SputnikError};

pub const KEY_ID_HEADER: &str = "X-Apple-CloudKit-Request-KeyID";
pub const DATE_HEADER: &str = "X-Apple-CloudKit-Request-ISO8601Date";
pub const SIGNATURE_HEADER: &str = "X-Apple-CloudKit-Request-SignatureV1";

/// Authentication headers of one request. Never reused: the date is part of
/// the signed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequestHeaders {
    pub key_id: String,
    pub date: String,
    pub signature: String,
}

impl SignedRequestHeaders {
    /// Header name/value pairs, names spelled as the service documents them.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (KEY_ID_HEADER, self.key_id.as_str()),
            (DATE_HEADER, self.date.as_str()),
            (SIGNATURE_HEADER, self.signature.as_str()),
        ]
        .into_iter()
    }
}

/// A fully signed request, ready to be handed to an HTTP client.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub method: Method,
    pub uri: Uri,
    pub body: Vec<u8>,
    pub headers: SignedRequestHeaders,
}

impl SignedRequest {
    pub fn path(&self) -> &str {
        self.uri.path()
    }
}

impl TryFrom<SignedRequest> for http::Request<Vec<u8>> {
    type Error = SputnikError;

    fn try_from(request: SignedRequest) -> Result<Self> {
        let mut builder = http::Request::builder()
            .method(request.method)
            .uri(request.uri);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        Ok(builder.body(request.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SignedRequest {
        SignedRequest {
            method: Method::POST,
            uri: Uri::from_static("https://api.apple-cloudkit.com/database/1/c/development/public/records/modify"),
            body: b"{}".to_vec(),
            headers: SignedRequestHeaders {
                key_id: "key".to_string(),
                date: "2017-01-02T15:04:05Z".to_string(),
                signature: "c2ln".to_string(),
            },
        }
    }

    #[test]
    fn header_names_are_exact() {
        let request = sample();
        let names: Vec<_> = request.headers.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            [
                "X-Apple-CloudKit-Request-KeyID",
                "X-Apple-CloudKit-Request-ISO8601Date",
                "X-Apple-CloudKit-Request-SignatureV1",
            ]
        );
    }

    #[test]
    fn converts_into_http_request() {
        let request: http::Request<Vec<u8>> = sample().try_into().unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri().host(), Some("api.apple-cloudkit.com"));
        assert_eq!(request.uri().scheme_str(), Some("https"));
        assert_eq!(request.headers()[KEY_ID_HEADER], "key");
        assert_eq!(request.headers()[DATE_HEADER], "2017-01-02T15:04:05Z");
        assert_eq!(request.headers()[SIGNATURE_HEADER], "c2ln");
        assert_eq!(request.body(), b"{}");
    }

    #[test]
    fn invalid_header_value_is_rejected() {
        let mut request = sample();
        request.headers.key_id = "line\nbreak".to_string();
        let err = http::Request::<Vec<u8>>::try_from(request).unwrap_err();
        assert!(matches!(err, SputnikError::InvalidRequest(_)));
    }
}
