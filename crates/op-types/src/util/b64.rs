//! Base64 encoding and decoding utilities.
//!
//! This module provides two small wrapper types for working with the two
//! base64 alphabets this crate needs: [`Base64Bytes`] for RFC 9421/9530
//! structured-field values (standard alphabet, padded) and
//! [`Base64UrlBytes`] for RFC 8037 JWK fields (URL-safe alphabet, no
//! padding).

use base64::Engine;
use base64::engine::general_purpose::STANDARD as STD_ENGINE;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as URL_ENGINE;
use std::borrow::Cow;
use std::fmt::Display;

/// A wrapper for standard-alphabet, padded base64 data.
///
/// Used for `Content-Digest`, `Signature`, and the nonce carried in
/// `Signature-Input`.
///
/// # Example
///
/// ```rust
/// use op_types::util::Base64Bytes;
///
/// let encoded = Base64Bytes::encode(b"hello world");
/// assert_eq!(encoded.to_string(), "aGVsbG8gd29ybGQ=");
///
/// let decoded = encoded.decode().unwrap();
/// assert_eq!(decoded, b"hello world");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Bytes<'a>(pub Cow<'a, [u8]>);

impl Base64Bytes<'_> {
    /// Decodes the base64 string bytes to raw binary data.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STD_ENGINE.decode(&self.0)
    }

    /// Encodes raw binary data into base64 string bytes.
    pub fn encode<T: AsRef<[u8]>>(input: T) -> Base64Bytes<'static> {
        let encoded = STD_ENGINE.encode(input.as_ref());
        Base64Bytes(Cow::Owned(encoded.into_bytes()))
    }
}

impl AsRef<[u8]> for Base64Bytes<'_> {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl<'a> From<&'a [u8]> for Base64Bytes<'a> {
    fn from(slice: &'a [u8]) -> Self {
        Base64Bytes(Cow::Borrowed(slice))
    }
}

impl Display for Base64Bytes<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.0.as_ref()))
    }
}

/// A wrapper for URL-safe, unpadded base64 data (RFC 4648 §5), as used by
/// JWK's `x` field (RFC 8037).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64UrlBytes(pub String);

impl Base64UrlBytes {
    /// Decodes the base64url string to raw binary data.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        URL_ENGINE.decode(&self.0)
    }

    /// Encodes raw binary data as an unpadded base64url string.
    pub fn encode<T: AsRef<[u8]>>(input: T) -> Base64UrlBytes {
        Base64UrlBytes(URL_ENGINE.encode(input.as_ref()))
    }
}

impl Display for Base64UrlBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
