//! LSAT-protected demo server.
//!
//! Reads the backend from the environment (or a `.env` file), e.g.
//!
//! ```text
//! LN_CLIENT_TYPE=LNURL
//! LNURL_ADDRESS=satoshi@example.com
//! ```
//!
//! Then try:
//!
//! ```text
//! curl localhost:3000/protected
//! curl -i -H 'Accept: application/vnd.lsat.v1.full+json' localhost:3000/protected
//! curl -H 'Authorization: LSAT <macaroon>:<preimage>' localhost:3000/protected
//! ```

use std::sync::Arc;

use axum::{Extension, Json, Router, routing::get};
use lsat_kit::{
    client::LnClient,
    config::LnClientConfig,
    core::store::MemoryRootKeyStore,
    paywall::{
        FREE_CONTENT_MESSAGE, PROTECTED_CONTENT_MESSAGE, paywall::PayWall, processor::LsatInfo,
    },
};
use serde_json::{Value, json};

async fn free() -> Json<Value> {
    Json(json!({ "code": 200, "message": FREE_CONTENT_MESSAGE }))
}

async fn protected(Extension(lsat): Extension<LsatInfo>) -> Json<Value> {
    match lsat {
        LsatInfo::Free => Json(json!({ "code": 200, "message": FREE_CONTENT_MESSAGE })),
        LsatInfo::Paid(_) => Json(json!({ "code": 200, "message": PROTECTED_CONTENT_MESSAGE })),
        LsatInfo::Error(err) => Json(json!({ "code": 500, "message": err.to_string() })),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let client = LnClient::from_config(LnClientConfig::from_env()?)?;
    let amount: u64 = std::env::var("LSAT_PRICE_SATS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5);

    let paywall = PayWall::builder()
        .provider(client)
        .store(Arc::new(MemoryRootKeyStore::new()))
        .amount(amount)
        .build();

    let app = Router::new()
        .route("/protected", get(protected))
        .route_layer(paywall)
        .route("/", get(free));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
