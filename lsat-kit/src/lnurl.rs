//! Lightning Address / LNURL-pay backend.

use lightning_invoice::Bolt11Invoice;
use lsat_core::{
    errors::{Error, Result},
    provider::{PaymentInvoice, PaymentProvider},
    types::{Amount, PaymentHash},
};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::{
    config::{ConfigError, LnurlOptions, http_client},
    unavailable,
};

/// `tag` of an LNURL-pay endpoint.
pub const PAY_REQUEST_TAG: &str = "payRequest";

/// First step of LNURL-pay: what the endpoint accepts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub callback: String,
    /// Millisatoshis.
    pub min_sendable: u64,
    /// Millisatoshis.
    pub max_sendable: u64,
    pub tag: String,
}

#[derive(Debug, Deserialize)]
struct CallbackResponse {
    pr: String,
}

/// Resolve a Lightning Address (`user@domain`) or LNURL-pay URL to the
/// endpoint serving the pay request.
pub fn resolve_address(address: &str) -> std::result::Result<Url, ConfigError> {
    let address = address.trim();
    let invalid = || ConfigError::InvalidAddress(address.to_string());

    if address.starts_with("https://") || address.starts_with("http://") {
        return Url::parse(address).map_err(|_| invalid());
    }

    match address.split_once('@') {
        Some((user, domain)) if !user.is_empty() && !domain.is_empty() && !domain.contains('/') => {
            Url::parse(&format!("https://{domain}/.well-known/lnurlp/{user}"))
                .map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}

/// Mints invoices by paying a Lightning Address through LNURL-pay.
#[derive(Debug, Clone)]
pub struct LnurlClient {
    pay_request_url: Url,
    client: reqwest::Client,
}

impl LnurlClient {
    pub fn new(options: LnurlOptions) -> std::result::Result<Self, ConfigError> {
        Ok(LnurlClient {
            pay_request_url: resolve_address(&options.address)?,
            client: http_client(options.timeout_secs, None)?,
        })
    }

    pub fn pay_request_url(&self) -> &Url {
        &self.pay_request_url
    }

    /// Fetch the endpoint's pay request.
    pub async fn pay_request(&self) -> Result<PayRequest> {
        let value = self.get_json(self.pay_request_url.clone()).await?;
        let pay_request: PayRequest = serde_json::from_value(value).map_err(unavailable)?;
        if pay_request.tag != PAY_REQUEST_TAG {
            return Err(Error::PaymentProviderUnavailable(format!(
                "Unexpected LNURL tag '{}'",
                pay_request.tag
            )));
        }
        Ok(pay_request)
    }

    /// GET a LNURL endpoint, surfacing `{"status": "ERROR"}` replies.
    async fn get_json(&self, url: Url) -> Result<Value> {
        let response = self.client.get(url).send().await.map_err(unavailable)?;
        let status = response.status();
        let value: Value = response.json().await.map_err(unavailable)?;

        if value
            .get("status")
            .and_then(Value::as_str)
            .is_some_and(|s| s.eq_ignore_ascii_case("ERROR"))
        {
            let reason = value
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or("unknown reason");
            return Err(Error::PaymentProviderUnavailable(format!(
                "LNURL error: {reason}"
            )));
        }
        if !status.is_success() {
            return Err(Error::PaymentProviderUnavailable(format!(
                "LNURL endpoint returned {status}"
            )));
        }

        Ok(value)
    }
}

impl PaymentProvider for LnurlClient {
    async fn create_invoice(&self, amount: Amount) -> Result<PaymentInvoice> {
        let msat = amount
            .as_msat()
            .filter(|msat| *msat > 0)
            .ok_or(Error::InvalidAmount(amount))?;

        let pay_request = self.pay_request().await?;
        if msat < pay_request.min_sendable || msat > pay_request.max_sendable {
            return Err(Error::InvalidAmount(amount));
        }

        let mut callback = Url::parse(&pay_request.callback).map_err(unavailable)?;
        callback
            .query_pairs_mut()
            .append_pair("amount", &msat.to_string());

        let response: CallbackResponse =
            serde_json::from_value(self.get_json(callback).await?).map_err(unavailable)?;

        let invoice: Bolt11Invoice = response.pr.parse().map_err(unavailable)?;
        if invoice.amount_milli_satoshis() != Some(msat) {
            return Err(Error::PaymentProviderUnavailable(format!(
                "LNURL invoice amount {:?} msat does not match requested {msat} msat",
                invoice.amount_milli_satoshis()
            )));
        }
        let payment_hash: PaymentHash = invoice
            .payment_hash()
            .to_string()
            .parse()
            .map_err(unavailable)?;

        #[cfg(feature = "tracing")]
        tracing::debug!("LNURL invoice created, payment_hash='{payment_hash}'");

        Ok(PaymentInvoice {
            payment_request: response.pr,
            payment_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_lightning_address() {
        assert_eq!(
            resolve_address("satoshi@example.com").unwrap().as_str(),
            "https://example.com/.well-known/lnurlp/satoshi"
        );
        assert_eq!(
            resolve_address("http://127.0.0.1:3000/lnurlp/alice").unwrap().as_str(),
            "http://127.0.0.1:3000/lnurlp/alice"
        );
    }

    #[test]
    fn test_resolve_rejects_garbage() {
        for address in ["", "satoshi", "@example.com", "satoshi@", "a@b/c"] {
            assert!(
                matches!(resolve_address(address), Err(ConfigError::InvalidAddress(_))),
                "'{address}' should be rejected"
            );
        }
    }

    #[test]
    fn test_pay_request_deserialize() {
        let pay_request: PayRequest = serde_json::from_value(serde_json::json!({
            "callback": "https://example.com/lnurlp/satoshi/callback",
            "maxSendable": 100000000,
            "minSendable": 1000,
            "metadata": "[[\"text/plain\",\"Pay satoshi\"]]",
            "tag": "payRequest"
        }))
        .unwrap();

        assert_eq!(pay_request.min_sendable, 1000);
        assert_eq!(pay_request.max_sendable, 100_000_000);
        assert_eq!(pay_request.tag, PAY_REQUEST_TAG);
    }
}
