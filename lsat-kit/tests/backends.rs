use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::Query,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use lsat_kit::{
    client::LnClient,
    config::{ConfigError, LnClientConfig, LndOptions, LnurlOptions},
    core::{
        errors::Error,
        issuer::TokenIssuer,
        macaroon::Macaroon,
        provider::PaymentProvider,
        store::{MemoryRootKeyStore, RootKeyStore},
        types::{Amount, PaymentHash, Preimage, RootKey},
        verifier::bound_payment_hash,
    },
    lnd::{LndClient, MACAROON_HEADER},
    lnurl::LnurlClient,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

async fn serve(listener: TcpListener, router: Router) -> SocketAddr {
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    addr
}

fn node_macaroon_hex() -> String {
    let macaroon = Macaroon::seal(
        &RootKey::generate(),
        Some("lnd".to_string()),
        b"invoice-macaroon".to_vec(),
        vec![],
    );
    hex::encode(macaroon.to_binary().unwrap())
}

/// A fake LND node accepting one macaroon and answering with `preimage`'s hash.
async fn mock_lnd(macaroon_hex: String, preimage: Preimage) -> SocketAddr {
    let router = Router::new().route(
        "/v1/invoices",
        post(move |headers: HeaderMap, Json(body): Json<Value>| async move {
            let authorized = headers
                .get(MACAROON_HEADER)
                .is_some_and(|v| v.as_bytes() == macaroon_hex.as_bytes());
            if !authorized {
                return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "permission denied" })));
            }
            let Some(value) = body["value"].as_str() else {
                return (StatusCode::BAD_REQUEST, Json(json!({ "message": "missing value" })));
            };
            (
                StatusCode::OK,
                Json(json!({
                    "r_hash": STANDARD.encode(preimage.hash().as_bytes()),
                    "payment_request": format!("lnbcrt{value}0n1mock"),
                    "add_index": "1",
                })),
            )
        }),
    );

    serve(TcpListener::bind("127.0.0.1:0").await.unwrap(), router).await
}

fn lnd_client(addr: SocketAddr, macaroon_hex: &str) -> LnClient {
    LnClient::from_config(LnClientConfig::Lnd(
        LndOptions::builder()
            .address(format!("http://{addr}"))
            .macaroon_hex(macaroon_hex)
            .build(),
    ))
    .unwrap()
}

#[tokio::test]
async fn test_lnd_creates_invoice() {
    let macaroon_hex = node_macaroon_hex();
    let preimage = Preimage::generate();
    let addr = mock_lnd(macaroon_hex.clone(), preimage).await;

    let client = lnd_client(addr, &macaroon_hex);
    assert_eq!(client.kind(), "LND");

    let invoice = client.create_invoice(Amount(5)).await.unwrap();
    assert_eq!(invoice.payment_hash, preimage.hash());
    assert_eq!(invoice.payment_request, "lnbcrt50n1mock");
}

#[tokio::test]
async fn test_lnd_rejected_macaroon_is_unavailable() {
    let addr = mock_lnd(node_macaroon_hex(), Preimage::generate()).await;

    let client = lnd_client(addr, &node_macaroon_hex());
    let err = client.create_invoice(Amount(5)).await.unwrap_err();
    assert!(matches!(err, Error::PaymentProviderUnavailable(_)), "{err:?}");
}

#[tokio::test]
async fn test_lnd_unreachable_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = lnd_client(addr, &node_macaroon_hex());
    let err = client.create_invoice(Amount(5)).await.unwrap_err();
    assert!(matches!(err, Error::PaymentProviderUnavailable(_)), "{err:?}");
}

#[tokio::test]
async fn test_issuer_over_lnd() {
    let macaroon_hex = node_macaroon_hex();
    let preimage = Preimage::generate();
    let addr = mock_lnd(macaroon_hex.clone(), preimage).await;

    let store = Arc::new(MemoryRootKeyStore::new());
    let issuer = TokenIssuer::builder()
        .provider(lnd_client(addr, &macaroon_hex))
        .store(store.clone())
        .build();

    let challenge = issuer.issue(Amount(5)).await.unwrap();
    let macaroon = Macaroon::from_base64(&challenge.macaroon).unwrap();
    assert_eq!(bound_payment_hash(&macaroon).unwrap(), preimage.hash());
    assert!(store.get(&preimage.hash()).is_some());
}

#[test]
fn test_lnd_construction_errors() {
    let options = || LndOptions::builder().address("localhost:10009");

    assert!(matches!(
        LnClient::from_config(LnClientConfig::Lnd(options().build())),
        Err(ConfigError::MissingMacaroon)
    ));
    assert!(matches!(
        LnClient::from_config(LnClientConfig::Lnd(options().macaroon_hex("zz").build())),
        Err(ConfigError::InvalidHex { field: "macaroon_hex", .. })
    ));
    assert!(matches!(
        LnClient::from_config(LnClientConfig::Lnd(options().macaroon_hex("deadbeef").build())),
        Err(ConfigError::InvalidMacaroon(_))
    ));
    assert!(matches!(
        LnClient::from_config(LnClientConfig::Lnd(
            options().macaroon_file("/nonexistent/admin.macaroon").build()
        )),
        Err(ConfigError::ReadFile { .. })
    ));
    assert!(matches!(
        LnClient::from_config(LnClientConfig::Lnd(
            options()
                .macaroon_hex(node_macaroon_hex())
                .cert_hex("not hex")
                .build()
        )),
        Err(ConfigError::InvalidHex { field: "cert_hex", .. })
    ));
}

#[test]
fn test_lnd_address_without_scheme_defaults_to_https() {
    let client = lsat_kit::lnd::LndClient::new(
        LndOptions::builder()
            .address("localhost:8080/")
            .macaroon_hex(node_macaroon_hex())
            .build(),
    )
    .unwrap();
    assert_eq!(
        client.invoices_url().as_str(),
        "https://localhost:8080/v1/invoices"
    );
}

/// BOLT11 test vector: 2500u (250 000 sat) to payment hash 0001..0102.
const COFFEE_INVOICE: &str = "lnbc2500u1pvjluezsp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygspp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdq5xysxxatsyp3k7enxv4jsxqzpu9qrsgquk0rl77nj30yxdy8j9vdx85fkpmdla2087ne0xh8nhedh8w27kyke0lp53ut353s06fv3qfegext0eh0ymjpf39tuven09sam30g4vgpfna3rh";
const COFFEE_PAYMENT_HASH: &str = "0001020304050607080900010203040506070809000102030405060708090102";
const COFFEE_MSAT: u64 = 250_000_000;

/// A fake LNURL-pay service: `alice` accepts 1..=10 sat but cannot mint
/// invoices, `bob` is disabled, `carol` is not a pay endpoint, and `dave`
/// answers every amount with the coffee invoice.
async fn mock_lnurl() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let router = Router::new()
        .route(
            "/lnurlp/alice",
            get(move || async move {
                Json(json!({
                    "callback": format!("http://{addr}/lnurlp/alice/callback"),
                    "minSendable": 1000,
                    "maxSendable": 10000,
                    "metadata": "[[\"text/plain\",\"Pay alice\"]]",
                    "tag": "payRequest",
                }))
            }),
        )
        .route(
            "/lnurlp/alice/callback",
            get(|| async { Json(json!({ "status": "ERROR", "reason": "Invoice service offline" })) }),
        )
        .route(
            "/lnurlp/bob",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "status": "ERROR", "reason": "Unknown user" })),
                )
            }),
        )
        .route(
            "/lnurlp/carol",
            get(|| async { Json(json!({ "tag": "withdrawRequest", "callback": "", "minSendable": 0, "maxSendable": 0 })) }),
        )
        .route(
            "/lnurlp/dave",
            get(move || async move {
                Json(json!({
                    "callback": format!("http://{addr}/lnurlp/dave/callback?k1=abc"),
                    "minSendable": 1000,
                    "maxSendable": 1_000_000_000u64,
                    "metadata": "[[\"text/plain\",\"Pay dave\"]]",
                    "tag": "payRequest",
                }))
            }),
        )
        .route(
            "/lnurlp/dave/callback",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                if params.get("k1").map(String::as_str) != Some("abc") {
                    return Json(json!({ "status": "ERROR", "reason": "callback query dropped" }));
                }
                match params.get("amount").and_then(|a| a.parse::<u64>().ok()) {
                    Some(_) => Json(json!({ "pr": COFFEE_INVOICE, "routes": [] })),
                    None => Json(json!({ "status": "ERROR", "reason": "missing amount" })),
                }
            }),
        );

    serve(listener, router).await
}

fn lnurl_client(addr: SocketAddr, user: &str) -> LnClient {
    LnClient::from_config(LnClientConfig::Lnurl(
        LnurlOptions::builder()
            .address(format!("http://{addr}/lnurlp/{user}"))
            .build(),
    ))
    .unwrap()
}

#[tokio::test]
async fn test_lnurl_amount_out_of_range() {
    let addr = mock_lnurl().await;
    let client = lnurl_client(addr, "alice");
    assert_eq!(client.kind(), "LNURL");

    assert_eq!(
        client.create_invoice(Amount(11)).await.unwrap_err(),
        Error::InvalidAmount(Amount(11))
    );
    assert_eq!(
        client.create_invoice(Amount(0)).await.unwrap_err(),
        Error::InvalidAmount(Amount(0))
    );
}

#[tokio::test]
async fn test_lnurl_error_status_is_unavailable() {
    let addr = mock_lnurl().await;

    let err = lnurl_client(addr, "alice")
        .create_invoice(Amount(5))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        Error::PaymentProviderUnavailable("LNURL error: Invoice service offline".to_string())
    );

    let err = lnurl_client(addr, "bob")
        .create_invoice(Amount(5))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        Error::PaymentProviderUnavailable("LNURL error: Unknown user".to_string())
    );
}

#[tokio::test]
async fn test_lnurl_wrong_tag_is_unavailable() {
    let addr = mock_lnurl().await;

    let err = lnurl_client(addr, "carol")
        .create_invoice(Amount(5))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PaymentProviderUnavailable(_)), "{err:?}");
}

#[test]
fn test_lnurl_invalid_address() {
    assert!(matches!(
        LnClient::from_config(LnClientConfig::Lnurl(
            LnurlOptions::builder().address("not an address").build()
        )),
        Err(ConfigError::InvalidAddress(_))
    ));
}

#[tokio::test]
async fn test_lnurl_creates_invoice() {
    let addr = mock_lnurl().await;
    let client = lnurl_client(addr, "dave");

    let invoice = client
        .create_invoice(Amount(COFFEE_MSAT / 1000))
        .await
        .unwrap();

    assert_eq!(invoice.payment_request, COFFEE_INVOICE);
    assert_eq!(
        invoice.payment_hash,
        COFFEE_PAYMENT_HASH.parse::<PaymentHash>().unwrap()
    );
}

#[tokio::test]
async fn test_issuer_over_lnurl_binds_invoice_hash() {
    let addr = mock_lnurl().await;
    let store = Arc::new(MemoryRootKeyStore::new());
    let issuer = TokenIssuer::builder()
        .provider(lnurl_client(addr, "dave"))
        .store(store.clone())
        .build();

    let challenge = issuer.issue(Amount(COFFEE_MSAT / 1000)).await.unwrap();
    let macaroon = Macaroon::from_base64(&challenge.macaroon).unwrap();

    assert_eq!(
        bound_payment_hash(&macaroon).unwrap(),
        challenge.invoice.payment_hash
    );
    assert!(store.get(&challenge.invoice.payment_hash).is_some());
}

#[tokio::test]
async fn test_lnurl_invoice_amount_mismatch_is_unavailable() {
    let addr = mock_lnurl().await;

    let err = lnurl_client(addr, "dave")
        .create_invoice(Amount(100_000))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, Error::PaymentProviderUnavailable(reason) if reason.contains("does not match")),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_lnd_stalled_node_times_out() {
    let macaroon_hex = node_macaroon_hex();
    let router = Router::new().route(
        "/v1/invoices",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({}))
        }),
    );
    let addr = serve(TcpListener::bind("127.0.0.1:0").await.unwrap(), router).await;

    let client = LnClient::from_config(LnClientConfig::Lnd(
        LndOptions::builder()
            .address(format!("http://{addr}"))
            .macaroon_hex(macaroon_hex)
            .timeout_secs(1)
            .build(),
    ))
    .unwrap();

    let err = client.create_invoice(Amount(5)).await.unwrap_err();
    assert!(matches!(err, Error::PaymentProviderUnavailable(_)), "{err:?}");
}

fn tls_cert_path() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/tls.cert")
}

#[test]
fn test_lnd_accepts_valid_certificate() {
    let pem = std::fs::read(tls_cert_path()).unwrap();

    LndClient::new(
        LndOptions::builder()
            .address("localhost:8080")
            .macaroon_hex(node_macaroon_hex())
            .cert_hex(hex::encode(&pem))
            .build(),
    )
    .unwrap();

    LndClient::new(
        LndOptions::builder()
            .address("localhost:8080")
            .macaroon_hex(node_macaroon_hex())
            .cert_file(tls_cert_path())
            .build(),
    )
    .unwrap();
}

#[test]
fn test_lnd_rejects_invalid_certificate() {
    let err = LndClient::new(
        LndOptions::builder()
            .address("localhost:8080")
            .macaroon_hex(node_macaroon_hex())
            .cert_hex(hex::encode("-----BEGIN CERTIFICATE-----\ngarbage\n-----END CERTIFICATE-----\n"))
            .build(),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidCertificate(_)), "{err:?}");
}

#[test]
fn test_lnd_rejects_v1_macaroon() {
    let v1 = b"0010location lnd\n0019identifier invoice\n";

    let err = LndClient::new(
        LndOptions::builder()
            .address("localhost:8080")
            .macaroon_hex(hex::encode(v1))
            .build(),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidMacaroon(_)), "{err:?}");
}

#[test]
fn test_zero_timeout_is_rejected() {
    let err = LnurlClient::new(
        LnurlOptions::builder()
            .address("satoshi@example.com")
            .timeout_secs(0)
            .build(),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidTimeout), "{err:?}");

    let err = LndClient::new(
        LndOptions::builder()
            .address("localhost:8080")
            .macaroon_hex(node_macaroon_hex())
            .timeout_secs(0)
            .build(),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidTimeout), "{err:?}");
}
