#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! The Open Payments trust engine.
//!
//! This crate turns [`op_types`] data into authenticated, resilient HTTP
//! traffic: [`signer`] builds and signs RFC 9421 signature bases,
//! [`grant_client`] drives the GNAP grant state machine, [`token`] manages
//! access-token lifecycle, and [`transport`]/[`retry`]/[`circuit_breaker`]/
//! [`resilient`] implement a decorator-based resilient HTTP client that is
//! agnostic to the underlying HTTP implementation.
//!
//! # Modules
//!
//! - [`signer`] - RFC 9421 signature base construction, signing, verification
//! - [`grant_client`] - GNAP grant request/continue/cancel
//! - [`token`] - access token rotation and revocation
//! - [`transport`] - the `Transport` capability trait and request/response model
//! - [`retry`] - retry delay strategies
//! - [`circuit_breaker`] - three-state circuit breaker
//! - [`resilient`] - retry + circuit breaker decorator over a base `Transport`
//! - [`mask`] - log redaction for sensitive header values

pub mod circuit_breaker;
pub mod grant_client;
pub mod mask;
pub mod resilient;
pub mod retry;
pub mod signer;
pub mod token;
pub mod transport;
