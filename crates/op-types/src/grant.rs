//! GNAP (RFC 9635) wire types: grant requests/responses, access descriptors,
//! continuation handles, and the access token shape.

use serde::{Deserialize, Serialize};

use crate::timestamp::UnixTimestamp;

/// Errors surfaced while classifying or parsing a [`GrantResponse`].
#[derive(Debug, thiserror::Error)]
pub enum GrantError {
    /// The authorization server returned a structured GNAP error object.
    #[error("grant request rejected: {code}{}", .description.as_deref().map(|d| format!(" ({d})")).unwrap_or_default())]
    Protocol {
        code: String,
        description: Option<String>,
    },
    /// The response carried none of `continue`, `access_token`, or
    /// `interact` — no outcome state matches.
    #[error("grant response matches no known outcome state")]
    UnclassifiableResponse,
}

/// Errors arising from access token inspection.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("access token value is blank")]
    BlankValue,
}

/// An amount in GNAP's `{value, assetCode, assetScale}` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub value: String,
    #[serde(rename = "assetCode")]
    pub asset_code: String,
    #[serde(rename = "assetScale")]
    pub asset_scale: u32,
}

/// Spend limits attached to an [`Access`] descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    #[serde(rename = "debitAmount", skip_serializing_if = "Option::is_none")]
    pub debit_amount: Option<Amount>,
    #[serde(rename = "receiveAmount", skip_serializing_if = "Option::is_none")]
    pub receive_amount: Option<Amount>,
    /// ISO 8601 repeating interval, e.g. `R/2024-01-01T00:00:00Z/P1M`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}

/// A single requested or granted access right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Access {
    #[serde(rename = "type")]
    pub access_type: String,
    pub actions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<Limits>,
}

/// The requesting client's key reference and display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDisplay {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantClient {
    /// URL of the client's published JWK.
    pub key: String,
    pub display: ClientDisplay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractFinish {
    pub method: String,
    pub uri: String,
    pub nonce: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractRequest {
    pub start: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish: Option<InteractFinish>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenRequest {
    pub access: Vec<Access>,
}

/// The outbound GNAP grant request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRequest {
    pub access_token: AccessTokenRequest,
    pub client: GrantClient,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interact: Option<InteractRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinueAccessToken {
    pub value: String,
}

/// A continuation handle: where and with what token to resume the grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continue {
    pub access_token: ContinueAccessToken,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait: Option<u64>,
}

impl Continue {
    /// The continuation token, used as the GNAP bearer on follow-up calls.
    pub fn token(&self) -> &str {
        &self.access_token.value
    }
}

/// The access token portion of a GNAP response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantedAccessToken {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub access: Vec<Access>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractResponse {
    pub redirect: String,
    pub finish: String,
}

/// A GNAP protocol-level error object, as distinct from a bare non-2xx
/// HTTP status with an unparseable body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantErrorBody {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The inbound GNAP grant response body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrantResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#continue: Option<Continue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<GrantedAccessToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interact: Option<InteractResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<GrantErrorBody>,
}

impl GrantResponse {
    /// Classifies this response into the outcome state it represents,
    /// per the `continue` / `access_token` / `interact` presence table.
    ///
    /// # Errors
    ///
    /// Returns [`GrantError::Protocol`] if the server sent a structured
    /// GNAP error object, or [`GrantError::UnclassifiableResponse`] if none
    /// of `continue`, `access_token`, or `interact` is present.
    pub fn classify(&self) -> Result<GrantState, GrantError> {
        if let Some(err) = &self.error {
            return Err(GrantError::Protocol {
                code: err.code.clone(),
                description: err.description.clone(),
            });
        }
        match (&self.r#continue, &self.access_token, &self.interact) {
            (None, Some(_), None) => Ok(GrantState::Approved),
            (Some(_), None, Some(_)) => Ok(GrantState::InteractionRequired),
            (Some(_), None, None) => Ok(GrantState::Pending),
            _ => Err(GrantError::UnclassifiableResponse),
        }
    }
}

/// The GNAP grant negotiation state machine's states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantState {
    Init,
    RequestSent,
    InteractionRequired,
    Pending,
    Approved,
    Cancelled,
    Failed,
}

/// An event driving a [`GrantState`] transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantEvent {
    Send,
    ServerReplyOk(ClassifiedOutcome),
    ServerReplyErr,
    InteractApproved,
    Cancel,
}

/// The subset of [`GrantState`] a 2xx server reply can classify to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifiedOutcome {
    InteractionRequired,
    Pending,
    Approved,
}

impl GrantState {
    /// Whether this state admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GrantState::Approved | GrantState::Cancelled | GrantState::Failed)
    }

    /// Applies `event` to this state, returning the next state.
    ///
    /// Unexpected events (e.g. cancelling an already-terminal state) leave
    /// the state unchanged rather than panicking; callers that need to
    /// reject such calls check [`GrantState::is_terminal`] first.
    pub fn transition(self, event: GrantEvent) -> GrantState {
        use ClassifiedOutcome::*;
        use GrantEvent::*;
        use GrantState::*;

        match (self, event) {
            (Init, Send) => RequestSent,
            (RequestSent, ServerReplyOk(InteractionRequired)) => GrantState::InteractionRequired,
            (RequestSent, ServerReplyOk(Pending)) => GrantState::Pending,
            (RequestSent, ServerReplyOk(Approved)) => GrantState::Approved,
            (RequestSent, ServerReplyErr) => Failed,
            (GrantState::InteractionRequired, InteractApproved) => GrantState::Pending,
            (GrantState::Pending, ServerReplyOk(Pending)) => GrantState::Pending,
            (GrantState::Pending, ServerReplyOk(Approved)) => Approved,
            (GrantState::Pending, ServerReplyErr) => Failed,
            (state, Cancel) if !state.is_terminal() => Cancelled,
            (state, _) => state,
        }
    }
}

/// A resolved access token, with expiry predicates derived from
/// [`GrantedAccessToken`] plus a reference instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    manage: Option<String>,
    expires_at: Option<UnixTimestamp>,
    access: Vec<Access>,
}

impl AccessToken {
    /// Builds an [`AccessToken`] from the wire `GrantedAccessToken`,
    /// anchoring any `expires_in` offset to `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::BlankValue`] if the token value is blank.
    pub fn from_granted(granted: &GrantedAccessToken, issued_at: UnixTimestamp) -> Result<Self, TokenError> {
        if granted.value.trim().is_empty() {
            return Err(TokenError::BlankValue);
        }
        Ok(Self {
            value: granted.value.clone(),
            manage: granted.manage.clone(),
            expires_at: granted.expires_in.map(|secs| issued_at + secs),
            access: granted.access.clone(),
        })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn manage(&self) -> Option<&str> {
        self.manage.as_deref()
    }

    pub fn access(&self) -> &[Access] {
        &self.access
    }

    pub fn is_expired(&self, now: UnixTimestamp) -> bool {
        self.expires_at.is_some_and(|exp| exp.has_passed(now))
    }

    /// Whether this token expires within `threshold_secs` of `now`.
    pub fn is_expiring_soon(&self, now: UnixTimestamp, threshold_secs: u64) -> bool {
        self.expires_at.is_some_and(|exp| (now + threshold_secs) >= exp)
    }
}
