//! Exercises the GNAP grant flow end-to-end against an in-memory
//! `Transport`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use op_core::grant_client::GrantClient;
use op_core::signer::Signer;
use op_core::token::TokenManager;
use op_core::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use op_types::grant::{
    AccessTokenRequest, ClientDisplay, Continue, ContinueAccessToken, GrantClient as WireClient, GrantRequest,
    GrantState,
};
use op_types::key::KeyPair;

/// Replays a fixed queue of scripted responses, recording every request it
/// received for later assertions.
struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<HttpResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        Ok(self.responses.lock().unwrap().pop_front().expect("script exhausted"))
    }

    async fn close(&self) {}
}

fn ok(body: &str) -> HttpResponse {
    HttpResponse { status: 200, headers: Default::default(), body: body.as_bytes().to_vec() }
}

fn grant_request() -> GrantRequest {
    GrantRequest {
        access_token: AccessTokenRequest { access: vec![] },
        client: WireClient {
            key: "https://wallet.example/keys/k1".to_string(),
            display: ClientDisplay { name: "demo client".to_string(), uri: None },
        },
        interact: None,
    }
}

#[tokio::test]
async fn full_interaction_required_flow_reaches_approved() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        ok(r#"{"continue":{"access_token":{"value":"ct-1"},"uri":"https://as.example/continue"},"interact":{"redirect":"https://as.example/interact","finish":"f-1"}}"#),
        ok(r#"{"access_token":{"value":"at-1","manage":"https://as.example/token/1","expires_in":3600,"access":[]}}"#),
    ]));
    let signer = Arc::new(Signer::new(KeyPair::generate("client-key").unwrap()));
    let client = GrantClient::new(transport.clone(), signer);

    let (response, state) = client.request_grant("https://as.example/grant", &grant_request()).await.unwrap();
    assert_eq!(state, GrantState::InteractionRequired);
    let continue_info = response.r#continue.clone().expect("interaction_required carries continue");

    let (_response, state) = client.continue_grant(&continue_info, "interact-ref-xyz").await.unwrap();
    assert_eq!(state, GrantState::Approved);

    let requests = transport.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, "POST");
    assert!(requests[1].headers.get("Authorization").unwrap().starts_with("GNAP "));
}

#[tokio::test]
async fn direct_approval_skips_interaction() {
    let transport = Arc::new(ScriptedTransport::new(vec![ok(
        r#"{"access_token":{"value":"at-1","manage":"https://as.example/token/1","access":[]}}"#,
    )]));
    let signer = Arc::new(Signer::new(KeyPair::generate("client-key").unwrap()));
    let client = GrantClient::new(transport, signer);

    let (_response, state) = client.request_grant("https://as.example/grant", &grant_request()).await.unwrap();
    assert_eq!(state, GrantState::Approved);
}

#[tokio::test]
async fn cancel_sends_delete_to_continue_uri() {
    let transport = Arc::new(ScriptedTransport::new(vec![ok("")]));
    let signer = Arc::new(Signer::new(KeyPair::generate("client-key").unwrap()));
    let client = GrantClient::new(transport.clone(), signer);

    let continue_info = Continue {
        access_token: ContinueAccessToken { value: "ct-1".to_string() },
        uri: "https://as.example/continue".to_string(),
        wait: None,
    };
    client.cancel_grant(&continue_info).await.unwrap();

    let requests = transport.requests.lock().unwrap();
    assert_eq!(requests[0].method, "DELETE");
    assert_eq!(requests[0].uri, "https://as.example/continue");
}

#[tokio::test]
async fn approved_grant_token_can_then_be_rotated() {
    let grant_transport = Arc::new(ScriptedTransport::new(vec![ok(
        r#"{"access_token":{"value":"at-1","manage":"https://as.example/token/1","access":[]}}"#,
    )]));
    let signer = Arc::new(Signer::new(KeyPair::generate("client-key").unwrap()));
    let grant_client = GrantClient::new(grant_transport, signer.clone());

    let (response, state) = grant_client.request_grant("https://as.example/grant", &grant_request()).await.unwrap();
    assert_eq!(state, GrantState::Approved);
    let access_token = response.access_token.expect("approved response carries an access token");

    let token_transport = Arc::new(ScriptedTransport::new(vec![ok(
        r#"{"value":"at-2","manage":"https://as.example/token/1","access":[]}"#,
    )]));
    let token_manager = TokenManager::new(token_transport, signer);
    let rotated = token_manager
        .rotate_token(access_token.manage.as_deref().unwrap(), &access_token.value)
        .await
        .unwrap();
    assert_eq!(rotated.value(), "at-2");
}
