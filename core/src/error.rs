//! Error types for the Universal Messenger client.
//!
//! # Design
//! Two layers. The classifier turns an error response into an
//! [`HttpFailure`], which keeps the request and response it was raised for.
//! The endpoint operations then fold every lower-level failure into one of
//! the three public [`ApiError`] kinds, so callers only ever match on
//! authentication, detailed service and generic service errors.

use std::fmt;

use thiserror::Error;

use crate::http::{HttpRequest, HttpResponse, TransportError};

/// What the classifier decided about an error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 401: the API key was rejected.
    Authentication,
    /// 403, 409, 415, 422 and `param-missing` 400s; the message explains the cause.
    DetailedClient,
    /// Any other 4xx; the message is the HTTP reason phrase.
    Client,
    /// 507: the account ran out of storage.
    StorageExhausted,
    /// Any other 5xx; the message is the HTTP reason phrase.
    Server,
}

/// A classified HTTP error response.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HttpFailure {
    pub kind: FailureKind,
    pub message: String,
    pub request: HttpRequest,
    pub response: HttpResponse,
}

impl HttpFailure {
    pub fn status(&self) -> u16 {
        self.response.status
    }

    /// True for the server-side kinds (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(self.kind, FailureKind::Server | FailureKind::StorageExhausted)
    }
}

/// The XML encoder could not write the request document.
///
/// Writing into memory does not fail on valid input, so this signals a defect
/// rather than bad caller data.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoded document is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// A response body could not be mapped onto the requested entity type.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body is not well-formed JSON.
    #[error("malformed JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    /// Well-formed JSON whose values do not fit the entity's fields.
    #[error("response does not match the expected entity: {0}")]
    Mismatch(#[source] serde_json::Error),

    #[error("expected a JSON {expected}, got {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },
}

/// The request builder refused to produce an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid event request: {0}")]
pub struct RequestValidationError(pub String);

/// The environment configuration could not be loaded.
#[derive(Debug, Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(#[from] pub envy::Error);

/// Everything that lands in the catch-all [`ApiError::Service`] kind.
#[derive(Debug, Error)]
pub enum ServiceCause {
    #[error(transparent)]
    Http(Box<HttpFailure>),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to encode request into XML: {0}")]
    Encoding(#[from] EncodingError),

    #[error("failed to decode response: {0}")]
    Decoding(#[from] DecodeError),
}

/// Errors returned by the public endpoint operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service rejected the API key.
    #[error("{0}")]
    Authentication(Box<HttpFailure>),

    /// The service explained why it refused the request.
    #[error("{0}")]
    DetailedService(Box<HttpFailure>),

    /// Transport, encoding and decoding failures plus unclassified HTTP errors.
    #[error(transparent)]
    Service(ServiceCause),
}

impl ApiError {
    /// The classified HTTP failure behind this error, if the service answered.
    pub fn failure(&self) -> Option<&HttpFailure> {
        match self {
            ApiError::Authentication(failure) | ApiError::DetailedService(failure) => {
                Some(failure.as_ref())
            }
            ApiError::Service(ServiceCause::Http(failure)) => Some(failure.as_ref()),
            ApiError::Service(_) => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.failure().map(HttpFailure::status)
    }
}

impl From<HttpFailure> for ApiError {
    fn from(failure: HttpFailure) -> Self {
        match failure.kind {
            FailureKind::Authentication => ApiError::Authentication(Box::new(failure)),
            FailureKind::DetailedClient => ApiError::DetailedService(Box::new(failure)),
            FailureKind::Client | FailureKind::Server | FailureKind::StorageExhausted => {
                ApiError::Service(ServiceCause::Http(Box::new(failure)))
            }
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Service(err.into())
    }
}

impl From<EncodingError> for ApiError {
    fn from(err: EncodingError) -> Self {
        ApiError::Service(err.into())
    }
}

impl From<DecodeError> for ApiError {
    fn from(err: DecodeError) -> Self {
        ApiError::Service(err.into())
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Authentication => "authentication error",
            FailureKind::DetailedClient => "client error",
            FailureKind::Client => "client error",
            FailureKind::StorageExhausted => "server error",
            FailureKind::Server => "server error",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;

    fn failure(kind: FailureKind, status: u16) -> HttpFailure {
        HttpFailure {
            kind,
            message: "boom".to_string(),
            request: HttpRequest {
                method: HttpMethod::Get,
                url: "http://localhost/".to_string(),
                headers: Vec::new(),
                body: None,
            },
            response: HttpResponse::new(status, ""),
        }
    }

    #[test]
    fn authentication_failure_maps_to_authentication_error() {
        let err = ApiError::from(failure(FailureKind::Authentication, 401));
        assert!(matches!(err, ApiError::Authentication(_)));
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn detailed_failure_maps_to_detailed_service_error() {
        let err = ApiError::from(failure(FailureKind::DetailedClient, 409));
        assert!(matches!(err, ApiError::DetailedService(_)));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn unclassified_failures_map_to_service_error() {
        for (kind, status) in [
            (FailureKind::Client, 404),
            (FailureKind::Server, 500),
            (FailureKind::StorageExhausted, 507),
        ] {
            let err = ApiError::from(failure(kind, status));
            assert!(matches!(err, ApiError::Service(ServiceCause::Http(_))));
            assert_eq!(err.status(), Some(status));
        }
    }

    #[test]
    fn transport_error_has_no_failure() {
        let err = ApiError::from(TransportError::new("connection refused"));
        assert!(err.failure().is_none());
        assert_eq!(err.to_string(), "transport failure: connection refused");
    }
}
