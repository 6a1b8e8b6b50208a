//! Ed25519 key management and JWK (RFC 8037) serialization.
//!
//! [`KeyPair`] wraps an `ed25519-dalek` signing/verifying key pair and an
//! owning `key_id`. It never exposes the private scalar through `Debug` or
//! `Display`, and its [`JWK`] form carries only the public half.

use ed25519_dalek::pkcs8::DecodePrivateKey;
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::util::Base64UrlBytes;

/// Errors arising from key generation, loading, or derivation.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("key id must not be blank")]
    BlankKeyId,
    #[error("invalid PKCS#8 private key encoding")]
    InvalidPrivateKey(#[source] ed25519_dalek::pkcs8::Error),
    #[error("invalid X.509 SubjectPublicKeyInfo encoding: expected 44 bytes, got {0}")]
    InvalidPublicKeyLength(usize),
    #[error("invalid X.509 SubjectPublicKeyInfo encoding: unexpected OID prefix")]
    InvalidPublicKeyPrefix,
    #[error("public key bytes do not form a valid Ed25519 point")]
    MalformedPublicKey(#[source] ed25519_dalek::SignatureError),
    #[error("JWK `x` is not valid base64url")]
    InvalidJwkEncoding(#[source] base64::DecodeError),
    #[error("JWK `x` must decode to exactly 32 bytes, got {0}")]
    InvalidJwkKeyLength(usize),
}

/// The ASN.1 DER prefix for an Ed25519 SubjectPublicKeyInfo (X.509), i.e.
/// everything before the 32-byte raw public key in the standard 44-byte
/// encoding: `SEQUENCE { SEQUENCE { OID id-Ed25519 } BIT STRING }`.
const ED25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];

/// An Ed25519 key pair, identified by a non-blank `key_id`.
///
/// Equality compares only `(key_id, public_key)` — the private scalar is
/// never inspected, printed, or serialized.
pub struct KeyPair {
    key_id: String,
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("key_id", &self.key_id)
            .field("public_key", &Base64UrlBytes::encode(self.verifying_key.as_bytes()).0)
            .finish()
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.key_id == other.key_id && self.verifying_key == other.verifying_key
    }
}

impl Eq for KeyPair {}

impl KeyPair {
    fn new(key_id: String, signing_key: SigningKey, verifying_key: VerifyingKey) -> Result<Self, KeyError> {
        if key_id.trim().is_empty() {
            return Err(KeyError::BlankKeyId);
        }
        Ok(Self {
            key_id,
            signing_key,
            verifying_key,
        })
    }

    /// Generates a new Ed25519 key pair using the operating system's CSPRNG.
    pub fn generate(key_id: impl Into<String>) -> Result<Self, KeyError> {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Self::new(key_id.into(), signing_key, verifying_key)
    }

    /// Loads a key pair from a PKCS#8 DER-encoded private key and an X.509
    /// SubjectPublicKeyInfo DER-encoded public key.
    ///
    /// Public keys are required alongside private keys rather than derived,
    /// per this crate's design: deriving an Ed25519 public key from only the
    /// private scalar is a well-known footgun (clamping/encoding pitfalls),
    /// so this constructor uses the public key the issuer handed out instead
    /// of recomputing one from the private scalar.
    pub fn from_pkcs8_x509(
        key_id: impl Into<String>,
        priv_pkcs8_der: &[u8],
        pub_x509_der: &[u8],
    ) -> Result<Self, KeyError> {
        let signing_key =
            SigningKey::from_pkcs8_der(priv_pkcs8_der).map_err(KeyError::InvalidPrivateKey)?;
        let public_key_bytes = extract_raw_public_key(pub_x509_der)?;
        let verifying_key =
            VerifyingKey::from_bytes(&public_key_bytes).map_err(KeyError::MalformedPublicKey)?;
        Self::new(key_id.into(), signing_key, verifying_key)
    }

    /// The non-blank identifier owning this key pair.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// The 32-byte Ed25519 public key.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.verifying_key
    }

    /// Signs `data`, returning a 64-byte Ed25519 signature.
    ///
    /// Ed25519 is deterministic: signing identical bytes with the same key
    /// always yields an identical signature.
    pub fn sign(&self, data: &[u8]) -> [u8; 64] {
        self.signing_key.sign(data).to_bytes()
    }

    /// Verifies `signature` over `data` against this pair's public key.
    ///
    /// Returns `false` for a tampered or malformed signature; this is not an
    /// error condition. The only error case is a structurally invalid public
    /// key, which cannot happen for a [`KeyPair`] constructed through
    /// [`Self::generate`] or [`Self::from_pkcs8_x509`].
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let Ok(signature) = <[u8; 64]>::try_from(signature) else {
            return false;
        };
        let signature = Signature::from_bytes(&signature);
        self.verifying_key().verify(data, &signature).is_ok()
    }

    /// Produces this pair's public JWK (RFC 8037 OKP/Ed25519).
    pub fn to_jwk(&self) -> Jwk {
        Jwk {
            kid: self.key_id.clone(),
            alg: JwkAlg::EdDsa,
            kty: JwkKty::Okp,
            crv: JwkCrv::Ed25519,
            x: Base64UrlBytes::encode(self.verifying_key().as_bytes()).0,
            use_: Some(JwkUse::Sig),
        }
    }
}

/// Strips the 12-byte Ed25519 OID prefix from a 44-byte X.509
/// SubjectPublicKeyInfo DER encoding, returning the raw 32-byte public key.
fn extract_raw_public_key(der: &[u8]) -> Result<[u8; 32], KeyError> {
    if der.len() != 44 {
        return Err(KeyError::InvalidPublicKeyLength(der.len()));
    }
    if der[..12] != ED25519_SPKI_PREFIX {
        return Err(KeyError::InvalidPublicKeyPrefix);
    }
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&der[12..]);
    Ok(bytes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JwkAlg {
    #[serde(rename = "EdDSA")]
    EdDsa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JwkKty {
    #[serde(rename = "OKP")]
    Okp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JwkCrv {
    Ed25519,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JwkUse {
    #[serde(rename = "sig")]
    Sig,
}

/// A JSON Web Key (RFC 7517) restricted to the OKP/Ed25519 shape used by
/// Open Payments (RFC 8037).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kid: String,
    pub alg: JwkAlg,
    pub kty: JwkKty,
    pub crv: JwkCrv,
    pub x: String,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<JwkUse>,
}

impl Jwk {
    /// Whether this JWK satisfies its invariants: non-blank `kid`, and `x`
    /// decodes to exactly 32 bytes.
    pub fn is_valid(&self) -> bool {
        if self.kid.trim().is_empty() {
            return false;
        }
        match Base64UrlBytes(self.x.clone()).decode() {
            Ok(bytes) => bytes.len() == 32,
            Err(_) => false,
        }
    }

    /// Decodes the `x` field into a 32-byte Ed25519 public key.
    pub fn public_key_bytes(&self) -> Result<[u8; 32], KeyError> {
        let bytes = Base64UrlBytes(self.x.clone())
            .decode()
            .map_err(KeyError::InvalidJwkEncoding)?;
        <[u8; 32]>::try_from(bytes.as_slice())
            .map_err(|_| KeyError::InvalidJwkKeyLength(bytes.len()))
    }
}
