//! RFC 9421 signature base construction, signing, and verification.
//!
//! [`Signer`] wraps an immutable [`KeyPair`] and exposes the single
//! orchestration entry point `GrantClient` uses: given a
//! [`SignatureComponents`] plan, sign it and return the `Signature-Input` /
//! `Signature` header values ready to attach to an outbound request.

use base64::Engine as _;
use op_types::key::KeyPair;
use op_types::signature::{ComponentId, SignatureComponents, SignatureError};
use op_types::timestamp::UnixTimestamp;
use rand::RngCore;
use rand::rngs::OsRng;

const SIGNATURE_LABEL: &str = "sig";

/// The two header values a successful signing produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeaders {
    pub signature_input: String,
    pub signature: String,
}

/// Signs and verifies [`SignatureComponents`] using an Ed25519 [`KeyPair`].
///
/// Immutable after construction; `sign`/`verify` are safe to call
/// concurrently from multiple threads.
#[derive(Debug)]
pub struct Signer {
    key_pair: KeyPair,
}

impl Signer {
    pub fn new(key_pair: KeyPair) -> Self {
        Self { key_pair }
    }

    pub fn key_id(&self) -> &str {
        self.key_pair.key_id()
    }

    /// Builds the RFC 9421 signature base for `components` with respect to
    /// `identifiers`, in the exact order given.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::MissingHeader`] if any identifier names a
    /// header not present on `components`.
    fn signature_base(
        components: &SignatureComponents,
        identifiers: &[ComponentId],
    ) -> Result<String, SignatureError> {
        let mut base = String::new();
        for id in identifiers {
            let value = components.component_value(id)?;
            base.push_str(&format!("\"{id}\": {value}\n"));
        }
        let params = identifiers
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        base.push_str(&format!("\"@signature-params\": ({params})"));
        Ok(base)
    }

    /// Signs `components`, producing the `Signature-Input` and `Signature`
    /// header values. Draws a fresh 16-byte random nonce and the current
    /// Unix time for `created`.
    #[cfg_attr(feature = "telemetry", tracing::instrument(skip(self, components), fields(key_id = %self.key_id())))]
    pub fn sign_request(
        &self,
        components: &SignatureComponents,
    ) -> Result<SignatureHeaders, SignatureError> {
        let identifiers = components.component_identifiers();
        let base = Self::signature_base(components, &identifiers)?;
        let signature = self.key_pair.sign(base.as_bytes());

        let created = UnixTimestamp::now();
        let mut nonce_bytes = [0u8; 16];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = base64::engine::general_purpose::STANDARD.encode(nonce_bytes);

        let ids = identifiers
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let signature_input = format!(
            "{SIGNATURE_LABEL}=({ids});created={created};keyid=\"{}\";alg=\"ed25519\";nonce=\"{nonce}\"",
            self.key_id()
        );
        let signature_b64 = base64::engine::general_purpose::STANDARD.encode(signature);
        let signature_header = format!("{SIGNATURE_LABEL}=:{signature_b64}:");

        #[cfg(feature = "telemetry")]
        tracing::debug!(nonce = %nonce, created = %created, "signed request");

        Ok(SignatureHeaders {
            signature_input,
            signature: signature_header,
        })
    }

    /// Re-builds the signature base from `components` and `identifiers` and
    /// verifies `signature_header` (a `sig=:<b64>:` value) against it.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::MissingHeader`] if a named identifier's
    /// header is absent, or [`SignatureError::InvalidSignatureEncoding`] /
    /// [`SignatureError::InvalidSignatureLength`] if the signature value
    /// cannot be decoded into a 64-byte signature.
    pub fn verify_request(
        &self,
        components: &SignatureComponents,
        identifiers: &[ComponentId],
        signature_header: &str,
    ) -> Result<bool, SignatureError> {
        let base = Self::signature_base(components, identifiers)?;
        let b64 = signature_header
            .trim_start_matches(&format!("{SIGNATURE_LABEL}=:"))
            .trim_end_matches(':');
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .map_err(SignatureError::InvalidSignatureEncoding)?;
        if decoded.len() != 64 {
            return Err(SignatureError::InvalidSignatureLength(decoded.len()));
        }
        Ok(self.key_pair.verify(base.as_bytes(), &decoded))
    }
}
