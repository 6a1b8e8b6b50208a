#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core data types for an Open Payments client.
//!
//! This crate provides the foundational, transport-agnostic types used to
//! build and verify cryptographically signed Open Payments requests: Ed25519
//! keys and their JWK representation, RFC 9530 content digests, the RFC 9421
//! signature base construction inputs, and GNAP (RFC 9635) wire types for
//! grant negotiation and access tokens.
//!
//! # Modules
//!
//! - [`key`] - Ed25519 key pairs and JWK (JSON Web Key) encoding
//! - [`digest`] - RFC 9530 `Content-Digest` header values
//! - [`signature`] - RFC 9421 signature component plans and ordering
//! - [`grant`] - GNAP grant request/response wire types and state machine
//! - [`timestamp`] - Unix timestamp utilities for signature and token expiry
//! - [`util`] - Helper types (base64 encodings)
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod digest;
pub mod grant;
pub mod key;
pub mod signature;
pub mod timestamp;
pub mod util;
