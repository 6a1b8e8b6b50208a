//! GNAP grant request/continue/cancel orchestration.
//!
//! [`GrantClient`] drives the sign → transport → classify cycle: every call
//! is serialized to JSON, digested, assembled into a [`SignatureComponents`]
//! plan, signed, and shipped through a [`Transport`]. Responses advance a
//! [`GrantState`].

use std::sync::Arc;

use op_types::digest::ContentDigest;
use op_types::grant::{Continue, GrantEvent, GrantRequest, GrantResponse, GrantState};
use op_types::signature::{SignatureComponents, SignatureError};
use thiserror::Error;

use crate::signer::Signer;
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

/// Errors arising from a grant request, continuation, or cancellation.
#[derive(Debug, Error)]
pub enum GrantError {
    #[error("failed to construct request signature")]
    Signature(#[from] SignatureError),
    #[error("transport failed")]
    Transport(#[from] TransportError),
    #[error("failed to decode response body as JSON")]
    Json(#[source] serde_json::Error),
    #[error("grant server returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error(transparent)]
    Protocol(#[from] op_types::grant::GrantError),
}

/// Drives GNAP grant negotiation over a signed, resilient transport.
pub struct GrantClient {
    transport: Arc<dyn Transport>,
    signer: Arc<Signer>,
}

impl GrantClient {
    pub fn new(transport: Arc<dyn Transport>, signer: Arc<Signer>) -> Self {
        Self { transport, signer }
    }

    /// Signs and sends `body` as `method` to `uri`, attaching `Content-Digest`
    /// /`Content-Type`/`Content-Length` for non-empty bodies and an
    /// `Authorization: GNAP <token>` header when `bearer` is given. Returns
    /// the raw response on a 2xx status, without assuming the body is JSON.
    async fn send_raw(
        &self,
        method: &str,
        uri: &str,
        body: Option<&serde_json::Value>,
        bearer: Option<&str>,
    ) -> Result<HttpResponse, GrantError> {
        let body_bytes = body.map(serde_json::to_vec).transpose().map_err(GrantError::Json)?;

        let mut components = SignatureComponents::new(method, uri);
        if let Some(bytes) = &body_bytes {
            let digest = ContentDigest::digest(bytes);
            components = components
                .with_header("content-digest", digest.as_str().to_string())
                .with_header("content-type", "application/json")
                .with_header("content-length", bytes.len().to_string())
                .with_body(bytes.clone());
        }
        if let Some(token) = bearer {
            components = components.with_header("authorization", format!("GNAP {token}"));
        }

        let headers = self.signer.sign_request(&components)?;

        let mut request = HttpRequest::new(method, uri)
            .with_header("Signature-Input", headers.signature_input)
            .with_header("Signature", headers.signature);
        if let Some(bytes) = &body_bytes {
            request = request
                .with_header("Content-Digest", ContentDigest::digest(bytes).as_str().to_string())
                .with_header("Content-Type", "application/json")
                .with_header("Content-Length", bytes.len().to_string())
                .with_body(bytes.clone());
        }
        if let Some(token) = bearer {
            request = request.with_header("Authorization", format!("GNAP {token}"));
        }

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(GrantError::Http {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }

        Ok(response)
    }

    /// Like [`Self::send_raw`], but additionally decodes the response body as
    /// a [`GrantResponse`]. Every GNAP operation except cancellation expects
    /// a JSON body on success.
    async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<&serde_json::Value>,
        bearer: Option<&str>,
    ) -> Result<GrantResponse, GrantError> {
        let response = self.send_raw(method, uri, body, bearer).await?;
        serde_json::from_slice(&response.body).map_err(GrantError::Json)
    }

    /// Sends the initial grant request to `grant_endpoint`, returning the
    /// server's response alongside the [`GrantState`] it classifies to.
    pub async fn request_grant(
        &self,
        grant_endpoint: &str,
        request: &GrantRequest,
    ) -> Result<(GrantResponse, GrantState), GrantError> {
        let body = serde_json::to_value(request).map_err(GrantError::Json)?;
        let response = self.send("POST", grant_endpoint, Some(&body), None).await?;
        let outcome = response.classify()?;
        let state = GrantState::Init
            .transition(GrantEvent::Send)
            .transition(GrantEvent::ServerReplyOk(to_outcome(outcome)));
        Ok((response, state))
    }

    /// Continues a pending or interaction-required grant with `interact_ref`.
    pub async fn continue_grant(
        &self,
        continue_info: &Continue,
        interact_ref: &str,
    ) -> Result<(GrantResponse, GrantState), GrantError> {
        let body = serde_json::json!({ "interact_ref": interact_ref });
        let response = self
            .send("POST", &continue_info.uri, Some(&body), Some(continue_info.token()))
            .await?;
        let outcome = response.classify()?;
        Ok((response, GrantState::Pending.transition(GrantEvent::ServerReplyOk(to_outcome(outcome)))))
    }

    /// Cancels an in-progress grant by `DELETE`-ing its continuation URI.
    /// Authorization servers commonly answer a successful cancel with an
    /// empty or unclassifiable body, so this does not require a JSON
    /// response the way [`Self::request_grant`]/[`Self::continue_grant`] do.
    pub async fn cancel_grant(&self, continue_info: &Continue) -> Result<(), GrantError> {
        self.send_raw("DELETE", &continue_info.uri, None, Some(continue_info.token()))
            .await
            .map(|_| ())
    }
}

fn to_outcome(state: GrantState) -> op_types::grant::ClassifiedOutcome {
    use op_types::grant::ClassifiedOutcome::*;
    match state {
        GrantState::InteractionRequired => InteractionRequired,
        GrantState::Pending => Pending,
        GrantState::Approved => Approved,
        other => unreachable!("GrantResponse::classify never yields {other:?}"),
    }
}
