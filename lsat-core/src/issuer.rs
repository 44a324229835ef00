//! Token issuance: one fresh macaroon + invoice pair per call.

use std::sync::Arc;

use bon::Builder;

use crate::{
    errors::{Error, Result},
    header::www_authenticate,
    identifier::Identifier,
    macaroon::{Caveat, Macaroon},
    provider::{PaymentInvoice, PaymentProvider},
    store::RootKeyStore,
    types::{Amount, PaymentHash, RootKey},
};

/// Caveat key binding a macaroon to its payment hash.
pub const PAYMENT_HASH_CAVEAT: &str = "payment_hash";

/// Default macaroon location.
pub const DEFAULT_LOCATION: &str = "lsat";

/// A payment challenge: the sealed macaroon and the invoice that unlocks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// Base64-encoded macaroon.
    pub macaroon: String,
    pub invoice: PaymentInvoice,
}

impl Challenge {
    /// The `WWW-Authenticate` header value for this challenge.
    pub fn www_authenticate(&self) -> String {
        www_authenticate(&self.macaroon, &self.invoice.payment_request)
    }
}

/// Seal an LSAT macaroon for `payment_hash`.
pub fn seal_token(
    root_key: &RootKey,
    payment_hash: PaymentHash,
    location: Option<String>,
) -> Macaroon {
    Macaroon::seal(
        root_key,
        location,
        Identifier::new(payment_hash).encode(),
        vec![Caveat::new(PAYMENT_HASH_CAVEAT, &payment_hash.to_hex())],
    )
}

/// Mints LSAT challenges.
///
/// The root key of every issued macaroon is kept in the shared [`RootKeyStore`] so
/// that a [`TokenVerifier`](crate::verifier::TokenVerifier) on the same store can
/// check it later.
#[derive(Builder, Debug)]
pub struct TokenIssuer<P: PaymentProvider, S: RootKeyStore> {
    /// Backend minting the invoices.
    pub provider: P,
    /// Where root keys are kept.
    pub store: Arc<S>,
    /// Location written into issued macaroons.
    #[builder(into, default = DEFAULT_LOCATION.to_string())]
    pub location: String,
}

impl<P: PaymentProvider + Clone, S: RootKeyStore> Clone for TokenIssuer<P, S> {
    fn clone(&self) -> Self {
        TokenIssuer {
            provider: self.provider.clone(),
            store: self.store.clone(),
            location: self.location.clone(),
        }
    }
}

impl<P: PaymentProvider, S: RootKeyStore> TokenIssuer<P, S> {
    /// Create an invoice for `amount` and a macaroon bound to its payment hash.
    pub async fn issue(&self, amount: Amount) -> Result<Challenge> {
        if amount.is_zero() {
            return Err(Error::InvalidAmount(amount));
        }

        let invoice = self.provider.create_invoice(amount).await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Invoice created: amount={}, payment_hash='{}'",
            amount,
            invoice.payment_hash
        );

        let root_key = RootKey::generate();
        let macaroon = seal_token(&root_key, invoice.payment_hash, Some(self.location.clone()))
            .to_base64()
            .map_err(|err| Error::InternalEncodingError(err.to_string()))?;

        self.store.put(invoice.payment_hash, root_key);

        Ok(Challenge { macaroon, invoice })
    }
}
