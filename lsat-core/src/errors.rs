use crate::types::{Amount, PaymentHash};

/// Error types for LSAT issuance and verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The payment backend could not be reached or returned an unusable answer.
    #[error("Payment provider unavailable: {0}")]
    PaymentProviderUnavailable(String),

    /// The requested amount cannot be invoiced.
    #[error("Invalid amount: {0} sats")]
    InvalidAmount(Amount),

    /// The sealed token could not be serialized.
    #[error("Internal encoding error: {0}")]
    InternalEncodingError(String),

    /// The presented credential is not a well-formed LSAT.
    #[error("Invalid credential format: {0}")]
    InvalidCredentialFormat(String),

    /// No root key is known for the token's payment hash.
    #[error("Unknown token for payment hash {0}")]
    UnknownToken(PaymentHash),

    /// The macaroon signature or one of its caveats does not check out.
    #[error("Invalid macaroon signature")]
    InvalidSignature,

    /// The preimage is not 32 hex-encoded bytes.
    #[error("Malformed preimage: {0}")]
    MalformedPreimage(String),

    /// The preimage does not hash to the token's payment hash.
    #[error("Preimage does not match payment hash")]
    PreimageMismatch,
}

/// A specialized `Result` type for LSAT core operations.
pub type Result<T> = std::result::Result<T, Error>;
