//! Access token lifecycle: rotation and revocation, independent of an
//! in-progress grant.

use std::sync::Arc;

use op_types::grant::{AccessToken, GrantedAccessToken, TokenError as WireTokenError};
use op_types::signature::{SignatureComponents, SignatureError};
use op_types::timestamp::UnixTimestamp;
use thiserror::Error;

use crate::signer::Signer;
use crate::transport::{HttpRequest, Transport, TransportError};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to construct request signature")]
    Signature(#[from] SignatureError),
    #[error("transport failed")]
    Transport(#[from] TransportError),
    #[error("failed to decode response body as JSON")]
    Json(#[source] serde_json::Error),
    #[error("token server returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error(transparent)]
    Wire(#[from] WireTokenError),
}

/// Rotates and revokes GNAP access tokens against their `manage` URI,
/// independent of a specific [`crate::grant_client::GrantClient`] instance.
pub struct TokenManager {
    transport: Arc<dyn Transport>,
    signer: Arc<Signer>,
}

impl TokenManager {
    pub fn new(transport: Arc<dyn Transport>, signer: Arc<Signer>) -> Self {
        Self { transport, signer }
    }

    /// `POST manage_uri` with `Authorization: GNAP <token>`, returning the
    /// freshly issued [`AccessToken`].
    pub async fn rotate_token(&self, manage_uri: &str, token: &str) -> Result<AccessToken, TokenError> {
        let components = SignatureComponents::new("POST", manage_uri)
            .with_header("authorization", format!("GNAP {token}"));
        let headers = self.signer.sign_request(&components)?;

        let request = HttpRequest::new("POST", manage_uri)
            .with_header("Signature-Input", headers.signature_input)
            .with_header("Signature", headers.signature)
            .with_header("Authorization", format!("GNAP {token}"));

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(TokenError::Http {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }
        let granted: GrantedAccessToken = serde_json::from_slice(&response.body).map_err(TokenError::Json)?;
        AccessToken::from_granted(&granted, UnixTimestamp::now()).map_err(TokenError::from)
    }

    /// `DELETE manage_uri` with `Authorization: GNAP <token>`. Idempotent on
    /// 2xx/404: a token already revoked is not an error.
    pub async fn revoke_token(&self, manage_uri: &str, token: &str) -> Result<(), TokenError> {
        let components = SignatureComponents::new("DELETE", manage_uri)
            .with_header("authorization", format!("GNAP {token}"));
        let headers = self.signer.sign_request(&components)?;

        let request = HttpRequest::new("DELETE", manage_uri)
            .with_header("Signature-Input", headers.signature_input)
            .with_header("Signature", headers.signature)
            .with_header("Authorization", format!("GNAP {token}"));

        let response = self.transport.execute(request).await?;
        if response.is_success() || response.status == 404 {
            return Ok(());
        }
        Err(TokenError::Http {
            status: response.status,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        })
    }
}
