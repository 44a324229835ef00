//! Verification of presented LSAT credentials.

use std::sync::Arc;

use crate::{
    errors::{Error, Result},
    header::Credential,
    identifier::Identifier,
    issuer::PAYMENT_HASH_CAVEAT,
    macaroon::{Caveat, Macaroon},
    store::RootKeyStore,
    types::{PaymentHash, Preimage},
};

/// Proof that a request was paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LsatPaid {
    pub payment_hash: PaymentHash,
    pub preimage: Preimage,
}

/// Checks presented credentials against the root keys in a [`RootKeyStore`].
#[derive(Debug)]
pub struct TokenVerifier<S: RootKeyStore> {
    pub store: Arc<S>,
}

impl<S: RootKeyStore> Clone for TokenVerifier<S> {
    fn clone(&self) -> Self {
        TokenVerifier {
            store: self.store.clone(),
        }
    }
}

impl<S: RootKeyStore> TokenVerifier<S> {
    pub fn new(store: Arc<S>) -> Self {
        TokenVerifier { store }
    }

    /// Verify a credential. Checks run in this order, the first failure wins:
    ///
    /// 1. the macaroon decodes and is bound to a payment hash;
    /// 2. a root key is stored for that hash;
    /// 3. the signature and all caveats check out;
    /// 4. the preimage is 32 hex-encoded bytes;
    /// 5. the preimage hashes to the payment hash.
    pub fn verify(&self, credential: &Credential) -> Result<LsatPaid> {
        let macaroon = Macaroon::from_base64(&credential.token).map_err(|err| {
            Error::InvalidCredentialFormat(format!("Failed to decode macaroon: {err}"))
        })?;
        let payment_hash = bound_payment_hash(&macaroon)?;

        let root_key = self
            .store
            .get(&payment_hash)
            .ok_or(Error::UnknownToken(payment_hash))?;

        macaroon
            .verify(&root_key, |caveat| caveat_satisfied(caveat, &payment_hash))
            .map_err(|_err| {
                #[cfg(feature = "tracing")]
                tracing::debug!("Macaroon rejected: payment_hash='{payment_hash}', reason='{_err}'");
                Error::InvalidSignature
            })?;

        let preimage: Preimage = credential
            .preimage
            .trim()
            .parse()
            .map_err(|err: hex::FromHexError| Error::MalformedPreimage(err.to_string()))?;

        if preimage.hash() != payment_hash {
            return Err(Error::PreimageMismatch);
        }

        Ok(LsatPaid {
            payment_hash,
            preimage,
        })
    }
}

/// The payment hash a macaroon is bound to.
///
/// The identifier and the `payment_hash` caveat must agree.
pub fn bound_payment_hash(macaroon: &Macaroon) -> Result<PaymentHash> {
    let identifier = Identifier::decode(macaroon.identifier())
        .map_err(|err| Error::InvalidCredentialFormat(format!("Invalid identifier: {err}")))?;

    let caveat_hash = macaroon
        .caveats()
        .iter()
        .find_map(|c| match c.condition() {
            Some((PAYMENT_HASH_CAVEAT, value)) => Some(value),
            _ => None,
        })
        .ok_or_else(|| Error::InvalidCredentialFormat("missing payment_hash caveat".into()))?
        .parse::<PaymentHash>()
        .map_err(|err| Error::InvalidCredentialFormat(format!("Invalid payment_hash caveat: {err}")))?;

    if caveat_hash != identifier.payment_hash {
        return Err(Error::InvalidCredentialFormat(
            "payment_hash caveat does not match identifier".into(),
        ));
    }

    Ok(caveat_hash)
}

fn caveat_satisfied(caveat: &Caveat, payment_hash: &PaymentHash) -> bool {
    match caveat.condition() {
        Some((PAYMENT_HASH_CAVEAT, value)) => value
            .parse::<PaymentHash>()
            .is_ok_and(|hash| &hash == payment_hash),
        _ => false,
    }
}
