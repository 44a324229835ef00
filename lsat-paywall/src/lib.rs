//! # LSAT Paywall
//!
//! A framework-agnostic HTTP paywall for LSAT (Lightning Service Authentication Tokens).
//!
//! [`PayWall`](paywall::PayWall) decides, per request, whether the resource is
//! served for free, requires payment (`402` with a `WWW-Authenticate: LSAT`
//! challenge), was paid for, or carries a credential that failed verification.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use lsat_core::store::MemoryRootKeyStore;
//! use lsat_paywall::paywall::PayWall;
//!
//! let paywall = PayWall::builder()
//!     .provider(ln_client)
//!     .store(Arc::new(MemoryRootKeyStore::new()))
//!     .amount(5u64)
//!     .build();
//!
//! let response = paywall
//!     .handle_payment(request, |req| handler(req))
//!     .await
//!     .unwrap_or_else(|err| err.into_response());
//! ```
//!
//! ## Modules
//!
//! - [`paywall`]: The [`PayWall`](paywall::PayWall) struct and the decision flow.
//! - [`processor`]: [`RequestSignals`](processor::RequestSignals), [`AuthResult`](processor::AuthResult)
//!   and the [`LsatInfo`](processor::LsatInfo) handed to resource handlers.
//! - [`errors`]: The challenge / error responses.
//!
//! ## Error Handling
//!
//! [`ErrorResponse`](errors::ErrorResponse) implements `IntoResponse` for Axum and can be
//! turned into a plain `http::Response` for other frameworks:
//!
//! - `402 Payment Required`: challenge with the macaroon and invoice.
//! - `401 Unauthorized`: the presented LSAT was rejected.
//! - `503 Service Unavailable`: the Lightning backend could not create an invoice.
//!
//! The mapping for rejected credentials is configurable with
//! [`ErrorPolicy`](paywall::ErrorPolicy).

pub mod errors;
pub mod paywall;
pub mod processor;

#[cfg(feature = "axum")]
pub mod axum;

/// Message served to clients without a paid LSAT.
pub const FREE_CONTENT_MESSAGE: &str = "Free content";

/// Message served to clients with a paid LSAT.
pub const PROTECTED_CONTENT_MESSAGE: &str = "Protected content";

/// Message in the body of a `402` challenge.
pub const PAYMENT_REQUIRED_MESSAGE: &str = "Payment Required";
