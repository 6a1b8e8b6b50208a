//! RFC 9530 `Content-Digest` structured-field values.

use sha2::{Digest as _, Sha256};

use crate::util::Base64Bytes;

/// Errors arising from content digest computation.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("Content-Digest header is not in the expected `sha-256=:...:=` format")]
    MalformedHeader,
    #[error("Content-Digest hash is not valid base64")]
    InvalidEncoding(#[source] base64::DecodeError),
}

/// A `sha-256=:<base64>:=` content digest, as sent in the `Content-Digest`
/// header (RFC 9530).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Computes the digest of `body`.
    pub fn digest(body: &[u8]) -> Self {
        let hash = Sha256::digest(body);
        let encoded = Base64Bytes::encode(hash);
        Self(format!("sha-256=:{encoded}:="))
    }

    /// Returns `true` if `header` equals the digest of `body`.
    pub fn validate(body: &[u8], header: &str) -> bool {
        Self::digest(body).as_str() == header
    }

    /// Extracts the base64 hash portion of a `sha-256=:...:=` header,
    /// or an empty string if the format does not match.
    pub fn extract_hash(header: &str) -> &str {
        header
            .strip_prefix("sha-256=:")
            .and_then(|rest| rest.strip_suffix(":="))
            .unwrap_or("")
    }

    /// Whether `header` is `sha-256=:...:=` shaped AND the hash portion
    /// decodes as valid base64.
    pub fn is_valid_format(header: &str) -> bool {
        let hash = Self::extract_hash(header);
        !hash.is_empty() && Base64Bytes::from(hash.as_bytes()).decode().is_ok()
    }

    /// The full header value, e.g. `sha-256=:47DEQ...=:=`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
