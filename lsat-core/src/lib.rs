//! LSAT core library.
//!
//! This library provides the protocol engine for LSAT (Lightning Service
//! Authentication Tokens): issuing macaroons bound to a Lightning payment
//! hash, and verifying a presented macaroon together with the payment
//! preimage.
//!
//! - [`issuer`]: [`TokenIssuer`](issuer::TokenIssuer) mints a macaroon + invoice pair.
//! - [`verifier`]: [`TokenVerifier`](verifier::TokenVerifier) checks a presented credential.
//! - [`provider`]: the [`PaymentProvider`](provider::PaymentProvider) capability backends implement.
//! - [`store`]: root key storage shared between issuer and verifier.
//! - [`macaroon`]: the minimal macaroon primitive used for tokens.
//! - [`header`]: `Authorization` / `WWW-Authenticate` header codecs.

pub mod errors;
pub mod header;
pub mod identifier;
pub mod issuer;
pub mod macaroon;
pub mod provider;
pub mod store;
pub mod types;
pub mod verifier;
