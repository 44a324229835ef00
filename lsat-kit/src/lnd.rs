//! LND REST backend.

use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD};
use lsat_core::{
    errors::{Error, Result},
    macaroon::Macaroon,
    provider::{PaymentInvoice, PaymentProvider},
    types::{Amount, PaymentHash},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    config::{ConfigError, LndOptions, http_client},
    unavailable,
};

/// Header carrying the hex encoded macaroon on every LND REST call.
pub const MACAROON_HEADER: &str = "Grpc-Metadata-macaroon";

/// Memo attached to every invoice.
pub const INVOICE_MEMO: &str = "LSAT";

#[derive(Debug, Serialize)]
struct AddInvoiceRequest<'a> {
    /// Satoshis, as a decimal string.
    value: String,
    memo: &'a str,
}

#[derive(Debug, Deserialize)]
struct AddInvoiceResponse {
    /// Base64 payment hash.
    r_hash: String,
    payment_request: String,
}

/// Mints invoices on an LND node through its REST API.
#[derive(Debug, Clone)]
pub struct LndClient {
    invoices_url: Url,
    macaroon_hex: String,
    client: reqwest::Client,
}

impl LndClient {
    /// Build the client, loading the certificate and macaroon.
    ///
    /// Nothing is sent to the node until the first invoice is requested.
    pub fn new(options: LndOptions) -> std::result::Result<Self, ConfigError> {
        let certificate = match (&options.cert_hex, &options.cert_file) {
            (Some(cert_hex), _) => Some(decode_hex("cert_hex", cert_hex)?),
            (None, Some(path)) => Some(read_file(path)?),
            (None, None) => None,
        }
        .map(|pem| reqwest::Certificate::from_pem(&pem).map_err(ConfigError::InvalidCertificate))
        .transpose()?;

        let macaroon = match (&options.macaroon_hex, &options.macaroon_file) {
            (Some(macaroon_hex), _) => decode_hex("macaroon_hex", macaroon_hex)?,
            (None, Some(path)) => read_file(path)?,
            (None, None) => return Err(ConfigError::MissingMacaroon),
        };
        Macaroon::from_binary(&macaroon)?;

        let address = options.address.trim_end_matches('/');
        let invoices_url = if address.contains("://") {
            format!("{address}/v1/invoices")
        } else {
            format!("https://{address}/v1/invoices")
        };
        let invoices_url = Url::parse(&invoices_url)
            .map_err(|_| ConfigError::InvalidAddress(options.address.clone()))?;

        Ok(LndClient {
            invoices_url,
            macaroon_hex: hex::encode(macaroon),
            client: http_client(options.timeout_secs, certificate)?,
        })
    }

    pub fn invoices_url(&self) -> &Url {
        &self.invoices_url
    }
}

fn decode_hex(field: &'static str, value: &str) -> std::result::Result<Vec<u8>, ConfigError> {
    hex::decode(value.trim()).map_err(|source| ConfigError::InvalidHex { field, source })
}

fn read_file(path: &Path) -> std::result::Result<Vec<u8>, ConfigError> {
    std::fs::read(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

impl PaymentProvider for LndClient {
    async fn create_invoice(&self, amount: Amount) -> Result<PaymentInvoice> {
        if amount.is_zero() {
            return Err(Error::InvalidAmount(amount));
        }

        let response: AddInvoiceResponse = self
            .client
            .post(self.invoices_url.clone())
            .header(MACAROON_HEADER, &self.macaroon_hex)
            .json(&AddInvoiceRequest {
                value: amount.to_string(),
                memo: INVOICE_MEMO,
            })
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?
            .json()
            .await
            .map_err(unavailable)?;

        let r_hash = STANDARD.decode(&response.r_hash).map_err(unavailable)?;
        let payment_hash = PaymentHash::try_from(r_hash.as_slice()).map_err(unavailable)?;

        #[cfg(feature = "tracing")]
        tracing::debug!("LND invoice created, payment_hash='{payment_hash}'");

        Ok(PaymentInvoice {
            payment_request: response.payment_request,
            payment_hash,
        })
    }
}
