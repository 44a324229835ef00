use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use lsat_core::{
    errors::{Error, Result},
    provider::{PaymentInvoice, PaymentProvider},
    types::{Amount, PaymentHash, Preimage},
};

/// Payment backend double whose invoices can be "paid" by looking up the preimage.
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    pub preimages: Arc<Mutex<HashMap<PaymentHash, Preimage>>>,
    pub unavailable: bool,
}

impl MockProvider {
    pub fn pay(&self, payment_hash: &PaymentHash) -> Preimage {
        self.preimages.lock().unwrap()[payment_hash]
    }
}

impl PaymentProvider for MockProvider {
    async fn create_invoice(&self, amount: Amount) -> Result<PaymentInvoice> {
        if self.unavailable {
            return Err(Error::PaymentProviderUnavailable("connection refused".into()));
        }

        let preimage = Preimage::generate();
        let payment_hash = preimage.hash();
        self.preimages.lock().unwrap().insert(payment_hash, preimage);

        Ok(PaymentInvoice {
            payment_request: format!("lnbcrt{amount}0n1mock"),
            payment_hash,
        })
    }
}
