use http::{HeaderMap, Request, header};
use lsat_core::{
    errors::Error, header::FULL_CONTENT_MEDIA_TYPE, issuer::Challenge, verifier::LsatPaid,
};

/// What the gate needs to know about a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSignals {
    /// Raw `Authorization` header value, if the request carried one.
    pub authorization: Option<String>,
    /// Whether the client asked for the paid variant via `Accept`.
    pub wants_full_content: bool,
}

impl RequestSignals {
    /// Extract the signals from request headers.
    ///
    /// A non UTF-8 `Authorization` header still counts as present, and fails
    /// verification as malformed.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .map(|v| v.to_str().map(str::to_string).unwrap_or_default());

        let wants_full_content = headers.get_all(header::ACCEPT).iter().any(|v| {
            v.to_str().is_ok_and(|accept| {
                accept.split(',').any(|range| {
                    range
                        .split(';')
                        .next()
                        .is_some_and(|m| m.trim().eq_ignore_ascii_case(FULL_CONTENT_MEDIA_TYPE))
                })
            })
        });

        RequestSignals {
            authorization,
            wants_full_content,
        }
    }
}

/// Outcome of the gate's decision for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    /// No credential and no request for paid content.
    Free,
    /// The client must pay first.
    Challenge(Challenge),
    /// The credential checked out.
    Paid(LsatPaid),
    /// Verification or issuance failed.
    Error(Error),
}

impl AuthResult {
    pub fn is_paid(&self) -> bool {
        matches!(self, AuthResult::Paid(_))
    }

    pub fn as_error(&self) -> Option<&Error> {
        match self {
            AuthResult::Error(err) => Some(err),
            _ => None,
        }
    }
}

/// The LSAT state of a request when it reaches the resource handler.
///
/// Attached to the request extensions before running the handler.
///
/// # Example
///
/// ```rust
/// use axum::{extract::Extension, Json};
/// use lsat_paywall::{PROTECTED_CONTENT_MESSAGE, FREE_CONTENT_MESSAGE, processor::LsatInfo};
/// use serde_json::{json, Value};
///
/// async fn handler(Extension(lsat): Extension<LsatInfo>) -> Json<Value> {
///     match lsat {
///         LsatInfo::Paid(_) => Json(json!({ "message": PROTECTED_CONTENT_MESSAGE })),
///         LsatInfo::Free => Json(json!({ "message": FREE_CONTENT_MESSAGE })),
///         LsatInfo::Error(err) => Json(json!({ "message": err.to_string() })),
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LsatInfo {
    Free,
    Paid(LsatPaid),
    /// Only seen with [`ErrorPolicy::PassThrough`](crate::paywall::ErrorPolicy::PassThrough).
    Error(Error),
}

/// A request that passed the gate, before running the resource handler.
///
/// See [`PayWall`](crate::paywall::PayWall) for usage in the full flow.
#[derive(Debug)]
pub struct RequestProcessor<Req> {
    pub request: Request<Req>,
    pub lsat_info: LsatInfo,
}

impl<Req> RequestProcessor<Req> {
    /// Run the resource handler with [`LsatInfo`] attached to the request extensions.
    pub async fn run_handler<Fun, Fut, Res>(mut self, handler: Fun) -> Res
    where
        Fun: FnOnce(Request<Req>) -> Fut,
        Fut: Future<Output = Res>,
    {
        self.request.extensions_mut().insert(self.lsat_info);
        handler(self.request).await
    }
}
