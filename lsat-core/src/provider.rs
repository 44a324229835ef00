//! The payment backend capability.

use crate::{
    errors::Result,
    types::{Amount, PaymentHash},
};

/// An invoice minted by a [`PaymentProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentInvoice {
    /// BOLT11 payment request handed to the payer.
    pub payment_request: String,
    pub payment_hash: PaymentHash,
}

/// Something that can mint a Lightning invoice.
///
/// Implementations fail with [`Error::PaymentProviderUnavailable`](crate::errors::Error::PaymentProviderUnavailable)
/// when the backend cannot be reached or answers garbage, and with
/// [`Error::InvalidAmount`](crate::errors::Error::InvalidAmount) when the amount cannot be invoiced.
///
/// The returned future may be dropped at any point, e.g. when the HTTP request
/// it serves is cancelled; nothing may be committed on behalf of the caller
/// before it resolves.
pub trait PaymentProvider {
    fn create_invoice(
        &self,
        amount: Amount,
    ) -> impl Future<Output = Result<PaymentInvoice>> + Send;
}

impl<P: PaymentProvider + Send + Sync> PaymentProvider for std::sync::Arc<P> {
    fn create_invoice(
        &self,
        amount: Amount,
    ) -> impl Future<Output = Result<PaymentInvoice>> + Send {
        (**self).create_invoice(amount)
    }
}
