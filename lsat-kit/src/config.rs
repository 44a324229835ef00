use std::{path::PathBuf, time::Duration};

use bon::Builder;
use lsat_core::macaroon::MacaroonError;
use serde::{Deserialize, Serialize};

/// Request timeout applied to every backend call unless configured otherwise.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Connection options for an LND node's REST API.
///
/// Exactly one of `macaroon_hex` / `macaroon_file` is needed; the hex value
/// wins when both are set. The macaroon must be in the V2 binary format
/// (what `lncli bakemacaroon` and LND's `*.macaroon` files contain); legacy
/// V1 macaroons are rejected at construction. Without `cert_hex` or `cert_file` the system
/// trust store is used.
#[derive(Builder, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LndOptions {
    /// REST endpoint, e.g. `https://localhost:8080`. `https://` is assumed when no scheme is given.
    #[builder(into)]
    pub address: String,
    /// PEM certificate, hex encoded.
    #[builder(into)]
    #[serde(default)]
    pub cert_hex: Option<String>,
    #[builder(into)]
    #[serde(default)]
    pub cert_file: Option<PathBuf>,
    /// Binary macaroon in the V2 format LND writes, hex encoded.
    #[builder(into)]
    #[serde(default)]
    pub macaroon_hex: Option<String>,
    #[builder(into)]
    #[serde(default)]
    pub macaroon_file: Option<PathBuf>,
    #[builder(default = DEFAULT_TIMEOUT_SECS)]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Options for paying through a Lightning Address or LNURL-pay endpoint.
#[derive(Builder, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LnurlOptions {
    /// `user@domain` or a `http(s)` LNURL-pay URL.
    #[builder(into)]
    pub address: String,
    #[builder(default = DEFAULT_TIMEOUT_SECS)]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Which Lightning backend mints invoices.
///
/// ```
/// use lsat_kit::config::LnClientConfig;
///
/// let config: LnClientConfig = serde_json::from_str(
///     r#"{ "type": "LNURL", "address": "satoshi@example.com" }"#,
/// )
/// .unwrap();
/// assert!(matches!(config, LnClientConfig::Lnurl(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum LnClientConfig {
    Lnd(LndOptions),
    Lnurl(LnurlOptions),
}

impl LnClientConfig {
    pub const CLIENT_TYPE_VAR: &'static str = "LN_CLIENT_TYPE";
    pub const LND_ADDRESS_VAR: &'static str = "LND_ADDRESS";
    pub const LND_CERT_HEX_VAR: &'static str = "LND_CERT_HEX";
    pub const LND_CERT_FILE_VAR: &'static str = "LND_CERT_FILE";
    pub const LND_MACAROON_HEX_VAR: &'static str = "LND_MACAROON_HEX";
    pub const LND_MACAROON_FILE_VAR: &'static str = "LND_MACAROON_FILE";
    pub const LNURL_ADDRESS_VAR: &'static str = "LNURL_ADDRESS";

    /// Load the configuration from process environment variables.
    ///
    /// `LN_CLIENT_TYPE` selects `LND` or `LNURL`; empty variables count as unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::MissingEnvVar(name));

        let client_type = required(Self::CLIENT_TYPE_VAR)?;
        match client_type.trim().to_ascii_uppercase().as_str() {
            "LND" => Ok(LnClientConfig::Lnd(LndOptions {
                address: required(Self::LND_ADDRESS_VAR)?,
                cert_hex: var(Self::LND_CERT_HEX_VAR),
                cert_file: var(Self::LND_CERT_FILE_VAR).map(PathBuf::from),
                macaroon_hex: var(Self::LND_MACAROON_HEX_VAR),
                macaroon_file: var(Self::LND_MACAROON_FILE_VAR).map(PathBuf::from),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            })),
            "LNURL" => Ok(LnClientConfig::Lnurl(LnurlOptions {
                address: required(Self::LNURL_ADDRESS_VAR)?,
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            })),
            _ => Err(ConfigError::UnknownClientType(client_type)),
        }
    }
}

pub(crate) fn http_client(
    timeout_secs: u64,
    root_certificate: Option<reqwest::Certificate>,
) -> Result<reqwest::Client, ConfigError> {
    if timeout_secs == 0 {
        return Err(ConfigError::InvalidTimeout);
    }

    let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(timeout_secs));
    if let Some(cert) = root_certificate {
        builder = builder.add_root_certificate(cert);
    }
    builder.build().map_err(ConfigError::HttpClient)
}

/// Failure to build a payment backend from its configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("LND macaroon is missing")]
    MissingMacaroon,
    #[error("Invalid hex in {field}: {source}")]
    InvalidHex {
        field: &'static str,
        source: hex::FromHexError,
    },
    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TLS certificate: {0}")]
    InvalidCertificate(reqwest::Error),
    #[error("Invalid LND macaroon: {0}")]
    InvalidMacaroon(#[from] MacaroonError),
    #[error("Unknown LN client type '{0}', expected LND or LNURL")]
    UnknownClientType(String),
    #[error("Missing environment variable {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),
    #[error("Request timeout must be at least one second")]
    InvalidTimeout,
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),
}
