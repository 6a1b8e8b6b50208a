//! The request-signing plan: HTTP method, target URI, headers, and body a
//! signature is computed over, plus the RFC 9421 component-identifier
//! ordering rules.

use std::collections::BTreeMap;

/// Errors arising from signature base construction, signing, or
/// verification.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("component `{0}` was requested but its header is not present")]
    MissingHeader(String),
    #[error("signature value is not valid base64")]
    InvalidSignatureEncoding(#[source] base64::DecodeError),
    #[error("decoded signature is not 64 bytes (got {0})")]
    InvalidSignatureLength(usize),
}

/// A component identifier in an RFC 9421 signature base: either a derived
/// component (`@method`, `@target-uri`) or a plain HTTP header name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentId {
    Method,
    TargetUri,
    Header(String),
}

impl ComponentId {
    /// The textual form used in the signature base and `Signature-Input`,
    /// e.g. `@method` or `content-digest`.
    pub fn as_str(&self) -> &str {
        match self {
            ComponentId::Method => "@method",
            ComponentId::TargetUri => "@target-uri",
            ComponentId::Header(name) => name,
        }
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request-signing plan: method, absolute target URI, headers, and an
/// optional body.
///
/// Header names are normalized to lowercase on insertion so lookup is
/// case-insensitive, matching RFC 9421's treatment of HTTP field names.
#[derive(Debug, Clone)]
pub struct SignatureComponents {
    method: String,
    target_uri: String,
    headers: BTreeMap<String, String>,
    body: Option<Vec<u8>>,
}

impl SignatureComponents {
    /// Starts a new plan for `method` against the absolute `target_uri`.
    /// `method` is upper-cased per convention.
    pub fn new(method: impl AsRef<str>, target_uri: impl Into<String>) -> Self {
        Self {
            method: method.as_ref().to_ascii_uppercase(),
            target_uri: target_uri.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Adds a header to the plan. The name is lowercased for lookup.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Attaches a request body to the plan.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn target_uri(&self) -> &str {
        &self.target_uri
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(&name.to_ascii_lowercase())
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
    }

    /// The fixed, spec-mandated component identifier ordering for this
    /// plan: `@method`, `@target-uri`, then `authorization`,
    /// `content-digest`, `content-type`, `content-length` in that order,
    /// each included only when its header is present (and, for
    /// `content-digest`, only when a body is also present).
    pub fn component_identifiers(&self) -> Vec<ComponentId> {
        let mut ids = vec![ComponentId::Method, ComponentId::TargetUri];
        if self.has_header("authorization") {
            ids.push(ComponentId::Header("authorization".to_string()));
        }
        if self.has_header("content-digest") && self.body.is_some() {
            ids.push(ComponentId::Header("content-digest".to_string()));
        }
        if self.has_header("content-type") {
            ids.push(ComponentId::Header("content-type".to_string()));
        }
        if self.has_header("content-length") {
            ids.push(ComponentId::Header("content-length".to_string()));
        }
        ids
    }

    /// Resolves the value a given component identifier contributes to the
    /// signature base: the method, the target URI, or a header lookup.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::MissingHeader`] if `id` names a header that
    /// is not present on this plan.
    pub fn component_value(&self, id: &ComponentId) -> Result<String, SignatureError> {
        match id {
            ComponentId::Method => Ok(self.method.clone()),
            ComponentId::TargetUri => Ok(self.target_uri.clone()),
            ComponentId::Header(name) => self
                .header(name)
                .map(str::to_string)
                .ok_or_else(|| SignatureError::MissingHeader(name.clone())),
        }
    }
}
