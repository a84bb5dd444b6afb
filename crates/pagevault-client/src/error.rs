//! Turns transport failures and error responses into [`AppError`].

use reqwest::StatusCode;

use pagevault_core::error::{AppError, ErrorKind};

use crate::wire::ErrorBody;

/// Kind for an error code sent by the server.
fn kind_from_code(code: &str) -> Option<ErrorKind> {
    let kind = match code {
        "NOT_FOUND" => ErrorKind::NotFound,
        "VALIDATION" => ErrorKind::Validation,
        "CONFLICT" => ErrorKind::Conflict,
        "PAYLOAD_TOO_LARGE" => ErrorKind::PayloadTooLarge,
        "ENCODING" => ErrorKind::Encoding,
        "DECODING" => ErrorKind::Decoding,
        "STORAGE_READ" => ErrorKind::StorageRead,
        "STORAGE_WRITE" => ErrorKind::StorageWrite,
        "CONFIGURATION" => ErrorKind::Configuration,
        "INTERNAL" => ErrorKind::Internal,
        "SERVICE_UNAVAILABLE" => ErrorKind::ServiceUnavailable,
        _ => return None,
    };
    Some(kind)
}

/// Fallback kind when the body carries no usable code.
fn kind_from_status(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::BAD_REQUEST => ErrorKind::Validation,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::CONFLICT => ErrorKind::Conflict,
        StatusCode::PAYLOAD_TOO_LARGE => ErrorKind::PayloadTooLarge,
        StatusCode::UNPROCESSABLE_ENTITY => ErrorKind::Encoding,
        StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::BAD_GATEWAY
        | StatusCode::GATEWAY_TIMEOUT
        | StatusCode::REQUEST_TIMEOUT => ErrorKind::ServiceUnavailable,
        _ => ErrorKind::Internal,
    }
}

/// Build the error for a non-success response from its status and raw body.
pub(crate) fn from_response(status: StatusCode, body: &[u8]) -> AppError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(body) => {
            let kind = body
                .code
                .as_deref()
                .and_then(kind_from_code)
                .unwrap_or_else(|| kind_from_status(status));
            let message = match body.detail {
                Some(detail) => detail,
                None => body.error,
            };
            AppError::new(kind, message)
        }
        Err(_) => {
            let text = String::from_utf8_lossy(body);
            let message = if text.trim().is_empty() {
                format!("Server responded with {status}")
            } else {
                format!("Server responded with {status}: {}", text.trim())
            };
            AppError::new(kind_from_status(status), message)
        }
    }
}

/// Map a reqwest failure that never produced a response.
pub(crate) fn from_transport(err: reqwest::Error) -> AppError {
    let kind = if err.is_timeout() || err.is_connect() {
        ErrorKind::ServiceUnavailable
    } else if err.is_decode() {
        ErrorKind::Decoding
    } else if err.is_builder() {
        ErrorKind::Validation
    } else {
        ErrorKind::Internal
    };
    AppError::with_source(kind, "Request to PageVault server failed", err)
}
