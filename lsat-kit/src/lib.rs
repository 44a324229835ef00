//! # LSAT Kit
//!
//! Lightning payment backends for LSAT-protected HTTP services, plus
//! re-exports of the token engine and the paywall.
//!
//! ## Related Crates
//!
//! - **[`lsat_core`]**: identifiers, macaroons, token issuance and verification.
//! - **[`lsat_paywall`]**: the framework-agnostic HTTP gate (feature `paywall`).
//!
//! ## Backends
//!
//! - **[`lnd`]**: a Lightning node reached through the LND REST API.
//! - **[`lnurl`]**: a Lightning Address or LNURL-pay endpoint.
//!
//! Both are wrapped by [`client::LnClient`], built once from a
//! [`config::LnClientConfig`]:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use lsat_kit::{
//!     client::LnClient,
//!     config::{LnClientConfig, LnurlOptions},
//!     core::store::MemoryRootKeyStore,
//!     paywall::paywall::PayWall,
//! };
//!
//! let client = LnClient::from_config(LnClientConfig::Lnurl(
//!     LnurlOptions::builder().address("satoshi@example.com").build(),
//! ))
//! .unwrap();
//!
//! let paywall = PayWall::builder()
//!     .provider(client)
//!     .store(Arc::new(MemoryRootKeyStore::new()))
//!     .amount(5u64)
//!     .build();
//! ```

pub mod client;
pub mod config;
pub mod lnd;
pub mod lnurl;

pub use lsat_core as core;

#[cfg(feature = "paywall")]
pub use lsat_paywall as paywall;

use lsat_core::errors::Error;

pub(crate) fn unavailable(err: impl std::fmt::Display) -> Error {
    Error::PaymentProviderUnavailable(err.to_string())
}
