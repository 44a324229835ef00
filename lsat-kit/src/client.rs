use lsat_core::{
    errors::Result,
    provider::{PaymentInvoice, PaymentProvider},
    types::Amount,
};

use crate::{
    config::{ConfigError, LnClientConfig},
    lnd::LndClient,
    lnurl::LnurlClient,
};

/// The configured Lightning backend.
///
/// Chosen once from [`LnClientConfig`]; plug it into a `PayWall` or
/// `TokenIssuer` as the payment provider.
#[derive(Debug, Clone)]
pub enum LnClient {
    Lnd(LndClient),
    Lnurl(LnurlClient),
}

impl LnClient {
    pub fn from_config(config: LnClientConfig) -> std::result::Result<Self, ConfigError> {
        let client = match config {
            LnClientConfig::Lnd(options) => LnClient::Lnd(LndClient::new(options)?),
            LnClientConfig::Lnurl(options) => LnClient::Lnurl(LnurlClient::new(options)?),
        };

        #[cfg(feature = "tracing")]
        tracing::debug!("LN client ready: {}", client.kind());

        Ok(client)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LnClient::Lnd(_) => "LND",
            LnClient::Lnurl(_) => "LNURL",
        }
    }
}

impl From<LndClient> for LnClient {
    fn from(client: LndClient) -> Self {
        LnClient::Lnd(client)
    }
}

impl From<LnurlClient> for LnClient {
    fn from(client: LnurlClient) -> Self {
        LnClient::Lnurl(client)
    }
}

impl PaymentProvider for LnClient {
    async fn create_invoice(&self, amount: Amount) -> Result<PaymentInvoice> {
        match self {
            LnClient::Lnd(client) => client.create_invoice(amount).await,
            LnClient::Lnurl(client) => client.create_invoice(amount).await,
        }
    }
}
