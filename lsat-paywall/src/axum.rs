use std::{convert::Infallible, pin::Pin};

use axum::{
    extract::Request,
    response::{IntoResponse, Response},
};
use lsat_core::{provider::PaymentProvider, store::RootKeyStore};
use tower::{Layer, Service};

use crate::paywall::PayWall;

impl<P: PaymentProvider + Clone, St: RootKeyStore, S> Layer<S> for PayWall<P, St> {
    type Service = PayWallService<P, St, S>;

    fn layer(&self, inner: S) -> Self::Service {
        PayWallService {
            paywall: self.clone(),
            inner,
        }
    }
}

/// Service produced by using a [`PayWall`] as a tower layer.
pub struct PayWallService<P: PaymentProvider, St: RootKeyStore, S> {
    paywall: PayWall<P, St>,
    inner: S,
}

impl<P: PaymentProvider + Clone, St: RootKeyStore, S: Clone> Clone for PayWallService<P, St, S> {
    fn clone(&self) -> Self {
        PayWallService {
            paywall: self.paywall.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<P, St, S> Service<Request> for PayWallService<P, St, S>
where
    P: PaymentProvider + Clone + Send + Sync + 'static,
    St: RootKeyStore + 'static,
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let paywall = self.paywall.clone();
        // The readied service goes with this call; keep a fresh clone for the next one.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let response = paywall
                .handle_payment(request, |req| async move {
                    inner.call(req).await.unwrap_or_else(|err| match err {})
                })
                .await
                .unwrap_or_else(|err| err.into_response());

            Ok(response)
        })
    }
}
