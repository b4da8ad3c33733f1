//! Synchronous client core for the Universal Messenger newsletter API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). Hosts either run the HTTP
//! round trip themselves between `MessengerClient::build_*` and
//! `MessengerClient::parse_*`, or hand a [`Transport`] to
//! [`UniversalMessenger`], which does both in one call.
//!
//! # Design
//! - Outbound events are a typed tree ([`Event`]) filled directly or through
//!   [`EventRequestBuilder`], then written as XML by [`xml::to_xml`].
//! - Responses are classified before decoding; JSON bodies are decoded
//!   leniently (key spelling, malformed dates) by [`json`].
//! - Every public operation fails with one of the three [`ApiError`] kinds.
//! - Response DTOs are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod builder;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod http;
pub mod json;
pub mod messenger;
pub mod types;
pub mod url;
pub mod xml;

pub use builder::EventRequestBuilder;
pub use client::MessengerClient;
pub use config::Config;
pub use error::{
    ApiError, ConfigError, DecodeError, EncodingError, FailureKind, HttpFailure, RequestValidationError,
    ServiceCause,
};
pub use event::{EmbedImages, Event, Inline, TrackingMode};
pub use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use messenger::UniversalMessenger;
pub use types::{Collection, NewsletterChannel, NewsletterChannelCollection, NewsletterStatus};
