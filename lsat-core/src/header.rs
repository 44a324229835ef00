//! Codecs for the LSAT HTTP headers.
//!
//! - Request: `Authorization: LSAT <base64-macaroon>:<hex-preimage>`
//! - Challenge: `WWW-Authenticate: LSAT macaroon="<base64-macaroon>", invoice="<bolt11>"`

use std::{fmt::Display, str::FromStr};

use crate::errors::{Error, Result};

/// The authorization scheme name.
pub const LSAT_SCHEME: &str = "LSAT";

/// `Accept` media type a client sends to opt into the paid variant of a resource.
pub const FULL_CONTENT_MEDIA_TYPE: &str = "application/vnd.lsat.v1.full+json";

/// A credential presented in an `Authorization` header.
///
/// Both parts are kept undecoded; the verifier reports decoding failures at
/// the step they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Base64-encoded macaroon.
    pub token: String,
    /// Hex-encoded payment preimage.
    pub preimage: String,
}

impl Credential {
    pub fn new(token: impl Into<String>, preimage: impl Into<String>) -> Self {
        Credential {
            token: token.into(),
            preimage: preimage.into(),
        }
    }

    /// Parse an `Authorization` header value.
    pub fn from_authorization(value: &str) -> Result<Self> {
        let (scheme, rest) = value
            .trim()
            .split_once(' ')
            .ok_or_else(|| Error::InvalidCredentialFormat("missing authorization scheme".into()))?;

        if !scheme.eq_ignore_ascii_case(LSAT_SCHEME) {
            return Err(Error::InvalidCredentialFormat(format!(
                "unsupported authorization scheme '{scheme}'"
            )));
        }

        let (token, preimage) = rest.trim().split_once(':').ok_or_else(|| {
            Error::InvalidCredentialFormat("expected '<macaroon>:<preimage>'".into())
        })?;

        if token.is_empty() {
            return Err(Error::InvalidCredentialFormat("empty macaroon".into()));
        }

        Ok(Credential::new(token, preimage))
    }

    /// Render as an `Authorization` header value.
    pub fn to_authorization(&self) -> String {
        self.to_string()
    }
}

impl FromStr for Credential {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Credential::from_authorization(s)
    }
}

impl Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{LSAT_SCHEME} {}:{}", self.token, self.preimage)
    }
}

/// Render a `WWW-Authenticate` challenge value.
pub fn www_authenticate(macaroon: &str, payment_request: &str) -> String {
    format!("{LSAT_SCHEME} macaroon=\"{macaroon}\", invoice=\"{payment_request}\"")
}

/// Parse a `WWW-Authenticate` challenge into `(macaroon, invoice)`.
///
/// Returns `None` if the value is not an LSAT challenge.
pub fn parse_www_authenticate(value: &str) -> Option<(String, String)> {
    let (scheme, params) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(LSAT_SCHEME) {
        return None;
    }

    let mut macaroon = None;
    let mut invoice = None;
    for param in params.split(',') {
        let (key, value) = param.trim().split_once('=')?;
        let value = value.trim().trim_matches('"').to_string();
        match key.trim() {
            "macaroon" => macaroon = Some(value),
            "invoice" => invoice = Some(value),
            _ => {}
        }
    }

    Some((macaroon?, invoice?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_authorization() {
        let credential = Credential::from_authorization("LSAT AgEEbHNhdA==:00ff").unwrap();
        assert_eq!(credential.token, "AgEEbHNhdA==");
        assert_eq!(credential.preimage, "00ff");
        assert_eq!(credential.to_authorization(), "LSAT AgEEbHNhdA==:00ff");

        let lower: Credential = "lsat abc:def".parse().unwrap();
        assert_eq!(lower, Credential::new("abc", "def"));
    }

    #[test]
    fn test_parse_authorization_rejects_malformed() {
        for value in ["Bearer abc:def", "LSAT abcdef", "LSAT", "LSAT :def", ""] {
            assert!(
                matches!(
                    Credential::from_authorization(value),
                    Err(Error::InvalidCredentialFormat(_))
                ),
                "'{value}' should be rejected"
            );
        }
    }

    #[test]
    fn test_www_authenticate_round_trip() {
        let header = www_authenticate("AgEE", "lnbc50n1p0");
        assert_eq!(header, r#"LSAT macaroon="AgEE", invoice="lnbc50n1p0""#);
        assert_eq!(
            parse_www_authenticate(&header),
            Some(("AgEE".to_string(), "lnbc50n1p0".to_string()))
        );
        assert_eq!(parse_www_authenticate("Basic realm=\"x\""), None);
    }
}
