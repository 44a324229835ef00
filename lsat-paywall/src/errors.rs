use http::{HeaderName, HeaderValue, Response, StatusCode, header};
use lsat_core::{errors::Error, issuer::Challenge};
use serde::{Deserialize, Serialize};

use crate::PAYMENT_REQUIRED_MESSAGE;

/// JSON body of a paywall response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

/// Represents an error response from the paywall.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    pub status: StatusCode,
    /// `WWW-Authenticate` challenge, set on 402 responses.
    pub www_authenticate: Option<String>,
    pub body: ErrorBody,
}

impl ErrorResponse {
    /// `402 Payment Required` carrying the challenge.
    pub fn payment_required(challenge: &Challenge) -> Self {
        ErrorResponse {
            status: StatusCode::PAYMENT_REQUIRED,
            www_authenticate: Some(challenge.www_authenticate()),
            body: ErrorBody {
                code: StatusCode::PAYMENT_REQUIRED.as_u16(),
                message: PAYMENT_REQUIRED_MESSAGE.to_string(),
            },
        }
    }

    /// A failed LSAT check or issuance, reported with `status`.
    pub fn lsat_error(status: StatusCode, error: &Error) -> Self {
        ErrorResponse {
            status,
            www_authenticate: None,
            body: ErrorBody {
                code: status.as_u16(),
                message: error.to_string(),
            },
        }
    }

    /// Get the header to include in the response.
    ///
    /// Returns `None` if there is no challenge or the header value could not be created.
    pub fn header_value(&self) -> Option<(HeaderName, HeaderValue)> {
        self.www_authenticate
            .as_deref()
            .and_then(|s| HeaderValue::from_str(s).ok())
            .map(|v| (header::WWW_AUTHENTICATE, v))
    }

    /// Framework-agnostic response with a JSON body.
    pub fn into_http_response(self) -> Response<String> {
        let body = serde_json::to_string(&self.body).unwrap_or_default();
        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Some((name, val)) = self.header_value() {
            response.headers_mut().insert(name, val);
        }
        response
    }
}

/// Default status mapping for [`ErrorPolicy::Respond`](crate::paywall::ErrorPolicy::Respond).
///
/// - `401 Unauthorized`: the presented credential was rejected.
/// - `503 Service Unavailable`: the payment backend could not mint an invoice.
/// - `500 Internal Server Error`: misconfigured amount or encoding failure.
pub fn default_error_status(error: &Error) -> StatusCode {
    match error {
        Error::InvalidCredentialFormat(_)
        | Error::UnknownToken(_)
        | Error::InvalidSignature
        | Error::MalformedPreimage(_)
        | Error::PreimageMismatch => StatusCode::UNAUTHORIZED,
        Error::PaymentProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::InvalidAmount(_) | Error::InternalEncodingError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ErrorResponse {
    fn into_response(self) -> axum::response::Response {
        let header = self.header_value();
        let mut response = (self.status, axum::extract::Json(self.body)).into_response();
        if let Some((name, val)) = header {
            response.headers_mut().insert(name, val);
        }
        response
    }
}
