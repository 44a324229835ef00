//! The LSAT macaroon identifier.
//!
//! Layout: `version (u16, big-endian) || payment_hash (32) || token_id (32)`.

use rand::{RngCore, rngs::OsRng};

use crate::types::PaymentHash;

/// The only identifier version in use.
pub const IDENTIFIER_VERSION: u16 = 0;

/// Encoded identifier length in bytes.
pub const IDENTIFIER_LEN: usize = 2 + 32 + 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("Identifier must be 66 bytes, got {0}")]
    InvalidLength(usize),

    #[error("Unknown identifier version {0}")]
    UnknownVersion(u16),
}

/// Decoded LSAT identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identifier {
    pub payment_hash: PaymentHash,
    /// Random per-token value so two tokens for one payment hash never collide.
    pub token_id: [u8; 32],
}

impl Identifier {
    /// A new identifier with a random token id.
    pub fn new(payment_hash: PaymentHash) -> Self {
        let mut token_id = [0u8; 32];
        OsRng.fill_bytes(&mut token_id);
        Identifier {
            payment_hash,
            token_id,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(IDENTIFIER_LEN);
        out.extend_from_slice(&IDENTIFIER_VERSION.to_be_bytes());
        out.extend_from_slice(self.payment_hash.as_bytes());
        out.extend_from_slice(&self.token_id);
        out
    }

    pub fn decode(data: &[u8]) -> Result<Self, IdentifierError> {
        if data.len() != IDENTIFIER_LEN {
            return Err(IdentifierError::InvalidLength(data.len()));
        }
        let version = u16::from_be_bytes([data[0], data[1]]);
        if version != IDENTIFIER_VERSION {
            return Err(IdentifierError::UnknownVersion(version));
        }

        let mut payment_hash = [0u8; 32];
        payment_hash.copy_from_slice(&data[2..34]);
        let mut token_id = [0u8; 32];
        token_id.copy_from_slice(&data[34..]);

        Ok(Identifier {
            payment_hash: PaymentHash(payment_hash),
            token_id,
        })
    }
}
