//! HTTP paywall gating resources behind LSAT payments.
//!
//! For details, see the [`PayWall`] struct documentation.

use std::sync::Arc;

use http::{Request, StatusCode};
use lsat_core::{
    errors::Error,
    header::Credential,
    issuer::{DEFAULT_LOCATION, TokenIssuer},
    provider::PaymentProvider,
    store::RootKeyStore,
    types::Amount,
    verifier::TokenVerifier,
};

use crate::{
    errors::{ErrorResponse, default_error_status},
    processor::{AuthResult, LsatInfo, RequestProcessor, RequestSignals},
};

/// What the paywall does with a request whose LSAT check or issuance failed.
#[derive(Debug, Clone, Copy)]
pub enum ErrorPolicy {
    /// Reject the request with the status chosen by the function.
    Respond(fn(&Error) -> StatusCode),
    /// Run the handler anyway with [`LsatInfo::Error`] attached; the handler decides.
    PassThrough,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        ErrorPolicy::Respond(default_error_status)
    }
}

/// A HTTP paywall charging a fixed amount per LSAT.
///
/// ## Decision
///
/// | Request | Result |
/// |---|---|
/// | no `Authorization`, no full-content `Accept` | [`AuthResult::Free`] |
/// | no `Authorization`, `Accept: application/vnd.lsat.v1.full+json` | [`AuthResult::Challenge`] |
/// | `Authorization: LSAT <macaroon>:<preimage>` that verifies | [`AuthResult::Paid`] |
/// | `Authorization` that does not verify | [`AuthResult::Error`] |
///
/// A credential always takes precedence over the `Accept` header, so a client
/// that already paid is never challenged again.
///
/// ## Step-by-Step API
///
/// [`handle_payment`](PayWall::handle_payment) is the standard flow. It calls
/// [`process_request`](PayWall::process_request), which yields a
/// [`RequestProcessor`] for requests that may proceed, then
/// [`RequestProcessor::run_handler`] to run the resource handler with
/// [`LsatInfo`] in the request extensions. [`decide`](PayWall::decide) exposes
/// the bare decision for other transports.
#[derive(Debug)]
pub struct PayWall<P: PaymentProvider, S: RootKeyStore> {
    /// Mints challenges for unpaid full-content requests.
    pub issuer: TokenIssuer<P, S>,
    pub verifier: TokenVerifier<S>,
    /// The price of one LSAT.
    pub amount: Amount,
    pub error_policy: ErrorPolicy,
}

impl<P: PaymentProvider + Clone, S: RootKeyStore> Clone for PayWall<P, S> {
    fn clone(&self) -> Self {
        PayWall {
            issuer: self.issuer.clone(),
            verifier: self.verifier.clone(),
            amount: self.amount,
            error_policy: self.error_policy,
        }
    }
}

#[bon::bon]
impl<P: PaymentProvider, S: RootKeyStore> PayWall<P, S> {
    #[builder]
    pub fn new(
        provider: P,
        // Shared between issuance and verification.
        store: Arc<S>,
        #[builder(into)] amount: Amount,
        #[builder(default)] error_policy: ErrorPolicy,
        #[builder(into, default = DEFAULT_LOCATION.to_string())]
        location: String,
    ) -> Self {
        PayWall {
            issuer: TokenIssuer::builder()
                .provider(provider)
                .store(store.clone())
                .location(location)
                .build(),
            verifier: TokenVerifier::new(store),
            amount,
            error_policy,
        }
    }
}

impl<P: PaymentProvider, S: RootKeyStore> PayWall<P, S> {
    /// The per-request decision.
    pub async fn decide(&self, signals: &RequestSignals) -> AuthResult {
        let result = match (&signals.authorization, signals.wants_full_content) {
            (Some(authorization), _) => match Credential::from_authorization(authorization)
                .and_then(|credential| self.verifier.verify(&credential))
            {
                Ok(paid) => AuthResult::Paid(paid),
                Err(err) => AuthResult::Error(err),
            },
            (None, true) => match self.issuer.issue(self.amount).await {
                Ok(challenge) => AuthResult::Challenge(challenge),
                Err(err) => AuthResult::Error(err),
            },
            (None, false) => AuthResult::Free,
        };

        #[cfg(feature = "tracing")]
        match &result {
            AuthResult::Free => tracing::trace!("LSAT: free access"),
            AuthResult::Challenge(c) => {
                tracing::debug!("LSAT: challenge issued, payment_hash='{}'", c.invoice.payment_hash)
            }
            AuthResult::Paid(p) => tracing::debug!("LSAT: paid, payment_hash='{}'", p.payment_hash),
            AuthResult::Error(err) => tracing::warn!("LSAT: rejected: {err}"),
        }

        result
    }

    /// Entrypoint of an LSAT flow.
    ///
    /// Returns a [`RequestProcessor`] when the request may reach the handler,
    /// or the [`ErrorResponse`] to send instead.
    pub async fn process_request<Req>(
        &self,
        request: Request<Req>,
    ) -> Result<RequestProcessor<Req>, ErrorResponse> {
        let signals = RequestSignals::from_headers(request.headers());

        let lsat_info = match self.decide(&signals).await {
            AuthResult::Free => LsatInfo::Free,
            AuthResult::Paid(paid) => LsatInfo::Paid(paid),
            AuthResult::Challenge(challenge) => {
                return Err(ErrorResponse::payment_required(&challenge));
            }
            AuthResult::Error(err) => match self.error_policy {
                ErrorPolicy::Respond(status) => {
                    return Err(ErrorResponse::lsat_error(status(&err), &err));
                }
                ErrorPolicy::PassThrough => LsatInfo::Error(err),
            },
        };

        Ok(RequestProcessor {
            request,
            lsat_info,
        })
    }

    /// Standard LSAT flow: decide, then run the handler or answer with the
    /// challenge / error response.
    pub async fn handle_payment<Fun, Fut, Req, Res>(
        &self,
        request: Request<Req>,
        handler: Fun,
    ) -> Result<Res, ErrorResponse>
    where
        Fun: FnOnce(Request<Req>) -> Fut,
        Fut: Future<Output = Res>,
    {
        let response = self.process_request(request).await?.run_handler(handler).await;
        Ok(response)
    }
}

/// The LSAT request gate; another name for [`PayWall`].
pub type RequestGate<P, S> = PayWall<P, S>;
