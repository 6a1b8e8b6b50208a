#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! A [`reqwest`](https://docs.rs/reqwest)-backed [`op_core::transport::Transport`].
//!
//! [`ReqwestTransport`] adapts `reqwest::Client` to the transport-agnostic
//! [`op_core::transport::HttpRequest`]/[`op_core::transport::HttpResponse`]
//! model `op-core` signs and retries around. Wrap it in
//! [`op_core::resilient::ResilientTransport`] to get retries and a circuit
//! breaker for free.
//!
//! ## Quickstart
//!
//! ```rust,ignore
//! use op_reqwest::ReqwestTransport;
//! use op_core::resilient::{ResilientTransport, ResilientTransportConfig};
//! use op_core::retry::ExponentialDelay;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let base = ReqwestTransport::new(reqwest::Client::new());
//! let config = ResilientTransportConfig::new(Arc::new(ExponentialDelay::new(Duration::from_millis(100))));
//! let transport = ResilientTransport::new(base, config);
//! ```

mod transport;

pub use transport::*;
