//! Minimal macaroon primitive for LSAT tokens.
//!
//! Only first-party caveats are supported. The binary layout is the
//! standard macaroon V2 format, so tokens interoperate with other LSAT
//! implementations:
//!
//! ```text
//! 0x02
//! [location field]  identifier field  EOS
//! ( [location field]  identifier field  EOS )*   -- one per caveat
//! EOS
//! signature field
//! ```
//!
//! A field is `type (1 byte) || length (uvarint) || data`.
//!
//! A [`Macaroon`] is immutable: it is produced by [`Macaroon::seal`] and checked
//! with [`Macaroon::verify`].

use base64::{
    Engine,
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::types::RootKey;

type HmacSha256 = Hmac<Sha256>;

const VERSION_V2: u8 = 2;

const FIELD_EOS: u8 = 0;
const FIELD_LOCATION: u8 = 1;
const FIELD_IDENTIFIER: u8 = 2;
const FIELD_VERIFICATION_ID: u8 = 4;
const FIELD_SIGNATURE: u8 = 6;

/// Upper bound for a single encoded field.
pub const MAX_FIELD_LEN: usize = 65535;

const KEY_GENERATOR: &[u8] = b"macaroons-key-generator";

/// Errors raised while encoding, decoding or verifying a macaroon.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MacaroonError {
    #[error("Base64 decode error: {0}")]
    Base64DecodeError(#[from] base64::DecodeError),

    #[error("Unsupported macaroon version {0}")]
    UnsupportedVersion(u8),

    #[error("Macaroon is truncated")]
    Truncated,

    #[error("Unexpected field type {found}, expected {expected}")]
    UnexpectedField { expected: u8, found: u8 },

    #[error("Field of {0} bytes exceeds the maximum length")]
    FieldTooLong(usize),

    #[error("Location is not valid UTF-8")]
    InvalidLocation,

    #[error("Third-party caveats are not supported")]
    ThirdPartyCaveat,

    #[error("Signature must be 32 bytes, got {0}")]
    InvalidSignatureLength(usize),

    #[error("Trailing bytes after signature")]
    TrailingBytes,

    #[error("Signature mismatch")]
    SignatureMismatch,

    #[error("Caveat not satisfied: {0}")]
    CaveatNotSatisfied(String),
}

/// A first-party caveat, e.g. `payment_hash=<hex>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caveat(pub Vec<u8>);

impl Caveat {
    /// Build a `key=value` caveat.
    pub fn new(key: &str, value: &str) -> Self {
        Caveat(format!("{key}={value}").into_bytes())
    }

    /// Split a `key=value` caveat. Returns `None` for anything else.
    pub fn condition(&self) -> Option<(&str, &str)> {
        std::str::from_utf8(&self.0).ok()?.split_once('=')
    }
}

/// A sealed macaroon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macaroon {
    location: Option<String>,
    identifier: Vec<u8>,
    caveats: Vec<Caveat>,
    signature: [u8; 32],
}

impl Macaroon {
    /// Seal a new macaroon with the given root key.
    pub fn seal(
        root_key: &RootKey,
        location: Option<String>,
        identifier: Vec<u8>,
        caveats: Vec<Caveat>,
    ) -> Self {
        let signature = signature_chain(root_key, &identifier, &caveats);
        Macaroon {
            location,
            identifier,
            caveats,
            signature,
        }
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn identifier(&self) -> &[u8] {
        &self.identifier
    }

    pub fn caveats(&self) -> &[Caveat] {
        &self.caveats
    }

    pub fn signature(&self) -> &[u8; 32] {
        &self.signature
    }

    /// Check the signature against `root_key` and every caveat against `satisfied`.
    pub fn verify(
        &self,
        root_key: &RootKey,
        satisfied: impl Fn(&Caveat) -> bool,
    ) -> Result<(), MacaroonError> {
        let expected = signature_chain(root_key, &self.identifier, &self.caveats);
        if !bool::from(expected[..].ct_eq(&self.signature[..])) {
            return Err(MacaroonError::SignatureMismatch);
        }

        if let Some(caveat) = self.caveats.iter().find(|c| !satisfied(c)) {
            return Err(MacaroonError::CaveatNotSatisfied(
                String::from_utf8_lossy(&caveat.0).into_owned(),
            ));
        }

        Ok(())
    }

    /// Encode in the V2 binary format.
    pub fn to_binary(&self) -> Result<Vec<u8>, MacaroonError> {
        let mut out = vec![VERSION_V2];
        if let Some(location) = &self.location {
            write_field(&mut out, FIELD_LOCATION, location.as_bytes())?;
        }
        write_field(&mut out, FIELD_IDENTIFIER, &self.identifier)?;
        out.push(FIELD_EOS);

        for caveat in &self.caveats {
            write_field(&mut out, FIELD_IDENTIFIER, &caveat.0)?;
            out.push(FIELD_EOS);
        }
        out.push(FIELD_EOS);

        write_field(&mut out, FIELD_SIGNATURE, &self.signature)?;
        Ok(out)
    }

    /// Decode from the V2 binary format.
    pub fn from_binary(data: &[u8]) -> Result<Self, MacaroonError> {
        let (&version, rest) = data.split_first().ok_or(MacaroonError::Truncated)?;
        if version != VERSION_V2 {
            return Err(MacaroonError::UnsupportedVersion(version));
        }
        let mut reader = Reader { data: rest };

        let location = reader
            .optional_field(FIELD_LOCATION)?
            .map(|l| String::from_utf8(l.to_vec()).map_err(|_| MacaroonError::InvalidLocation))
            .transpose()?;
        let identifier = reader.expect_field(FIELD_IDENTIFIER)?.to_vec();
        reader.expect_eos()?;

        let mut caveats = Vec::new();
        while !reader.next_is_eos()? {
            // Caveat locations only matter for third-party caveats.
            reader.optional_field(FIELD_LOCATION)?;
            let id = reader.expect_field(FIELD_IDENTIFIER)?.to_vec();
            if reader.optional_field(FIELD_VERIFICATION_ID)?.is_some() {
                return Err(MacaroonError::ThirdPartyCaveat);
            }
            reader.expect_eos()?;
            caveats.push(Caveat(id));
        }
        reader.expect_eos()?;

        let signature = reader.expect_field(FIELD_SIGNATURE)?;
        let signature: [u8; 32] = signature
            .try_into()
            .map_err(|_| MacaroonError::InvalidSignatureLength(signature.len()))?;
        if !reader.data.is_empty() {
            return Err(MacaroonError::TrailingBytes);
        }

        Ok(Macaroon {
            location,
            identifier,
            caveats,
            signature,
        })
    }

    /// Binary form encoded with standard, padded base64.
    pub fn to_base64(&self) -> Result<String, MacaroonError> {
        Ok(STANDARD.encode(self.to_binary()?))
    }

    /// Decode base64 in either the standard or URL-safe alphabet, padded or not.
    pub fn from_base64(encoded: &str) -> Result<Self, MacaroonError> {
        let encoded = encoded.trim();
        let binary = STANDARD
            .decode(encoded)
            .or_else(|_| URL_SAFE.decode(encoded))
            .or_else(|_| STANDARD_NO_PAD.decode(encoded))
            .or_else(|_| URL_SAFE_NO_PAD.decode(encoded))?;
        Self::from_binary(&binary)
    }
}

fn hmac(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

fn signature_chain(root_key: &RootKey, identifier: &[u8], caveats: &[Caveat]) -> [u8; 32] {
    let derived = hmac(KEY_GENERATOR, root_key.as_bytes());
    caveats
        .iter()
        .fold(hmac(&derived, identifier), |sig, caveat| hmac(&sig, &caveat.0))
}

fn write_field(out: &mut Vec<u8>, field_type: u8, data: &[u8]) -> Result<(), MacaroonError> {
    if data.len() > MAX_FIELD_LEN {
        return Err(MacaroonError::FieldTooLong(data.len()));
    }
    out.push(field_type);
    let mut len = data.len();
    while len >= 0x80 {
        out.push((len as u8) | 0x80);
        len >>= 7;
    }
    out.push(len as u8);
    out.extend_from_slice(data);
    Ok(())
}

struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn peek_type(&self) -> Result<u8, MacaroonError> {
        self.data.first().copied().ok_or(MacaroonError::Truncated)
    }

    fn next_is_eos(&self) -> Result<bool, MacaroonError> {
        Ok(self.peek_type()? == FIELD_EOS)
    }

    fn expect_eos(&mut self) -> Result<(), MacaroonError> {
        match self.peek_type()? {
            FIELD_EOS => {
                let buf: &'a [u8] = self.data;
                self.data = &buf[1..];
                Ok(())
            }
            found => Err(MacaroonError::UnexpectedField {
                expected: FIELD_EOS,
                found,
            }),
        }
    }

    fn optional_field(&mut self, field_type: u8) -> Result<Option<&'a [u8]>, MacaroonError> {
        if self.peek_type()? != field_type {
            return Ok(None);
        }
        self.read_field().map(|(_, data)| Some(data))
    }

    fn expect_field(&mut self, field_type: u8) -> Result<&'a [u8], MacaroonError> {
        let found = self.peek_type()?;
        if found != field_type {
            return Err(MacaroonError::UnexpectedField {
                expected: field_type,
                found,
            });
        }
        self.read_field().map(|(_, data)| data)
    }

    fn read_field(&mut self) -> Result<(u8, &'a [u8]), MacaroonError> {
        let buf: &'a [u8] = self.data;
        let field_type = self.peek_type()?;
        let mut pos = 1;
        let mut len: usize = 0;
        let mut shift = 0;
        loop {
            let byte = *buf.get(pos).ok_or(MacaroonError::Truncated)?;
            pos += 1;
            len |= ((byte & 0x7f) as usize) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift > 21 {
                return Err(MacaroonError::FieldTooLong(len));
            }
        }
        if len > MAX_FIELD_LEN {
            return Err(MacaroonError::FieldTooLong(len));
        }
        let end = pos.checked_add(len).ok_or(MacaroonError::Truncated)?;
        let data = buf.get(pos..end).ok_or(MacaroonError::Truncated)?;
        self.data = &buf[end..];
        Ok((field_type, data))
    }
}
