//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! crate builds `HttpRequest` values and parses `HttpResponse` values without
//! ever touching the network. Hosts that want the full round trip in one call
//! hand a [`Transport`] to [`crate::UniversalMessenger`]; the transport is the
//! only place where I/O happens.
//!
//! All fields use owned types (`String`, `Vec`) so failures can carry the
//! request and response they were raised for.

use thiserror::Error;

/// Header naming the logical API operation, read by the service for routing
/// and request logging.
pub const API_METHOD_HEADER: &str = "X-API-METHOD";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `MessengerClient::build_*` methods. `url` is absolute and already
/// carries the API key query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Reason phrase sent with the status line, e.g. `Not Found`.
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Build a response whose reason phrase is the canonical one for `status`.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            reason: canonical_reason(status).to_string(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Canonical reason phrase for a status code, or `""` when there is none.
pub fn canonical_reason(status: u16) -> &'static str {
    ::http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("")
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// A connectivity-level failure: DNS, refused connection, timeout, broken
/// stream. HTTP error statuses are not transport errors.
#[derive(Debug, Clone, Error)]
#[error("transport failure: {message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Executes one HTTP round trip.
///
/// Implementations must hand back 4xx and 5xx responses as `Ok(HttpResponse)`
/// so the error classifier can inspect them. Timeouts and cancellation are the
/// implementation's business.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}
