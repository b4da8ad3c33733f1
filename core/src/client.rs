//! Stateless HTTP request builder and response parser for the Universal
//! Messenger endpoints.
//!
//! # Design
//! `MessengerClient` holds only the base URL and the API key and carries no
//! mutable state between calls. Each endpoint operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method that
//! consumes the matching `HttpResponse`. The caller executes the actual HTTP
//! round trip, keeping the core deterministic and free of I/O.
//!
//! Every `parse_*` method runs the response through the error classifier
//! first, so a 4xx/5xx never reaches the JSON decoder.

use std::fmt;

use crate::classify::classify;
use crate::config::Config;
use crate::error::{ApiError, EncodingError};
use crate::event::Event;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, API_METHOD_HEADER};
use crate::json::{decode_collection, decode_entity};
use crate::types::{NewsletterChannelCollection, NewsletterStatus};
use crate::url::{
    build_url, encode_segment, redact_param, EVENT_FILE_KEY_PARAM, EVENT_FILE_PATH, NEWSLETTER_KEY_PARAM,
    NEWSLETTER_PATH,
};
use crate::xml::to_xml;

/// Content type of the event-file upload.
pub const XML_CONTENT_TYPE: &str = "text/xml; charset=UTF-8";

/// Synchronous, stateless client for the Universal Messenger API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network.
#[derive(Clone)]
pub struct MessengerClient {
    base_url: String,
    api_key: String,
}

impl MessengerClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.base_url, &config.api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET <base>/de.pinuts.cmsbs.restapi.Channels/index?umopen=<key>`
    pub fn build_channels(&self) -> HttpRequest {
        let url = build_url(
            &self.base_url,
            &[NEWSLETTER_PATH, "Channels/index"],
            &[(NEWSLETTER_KEY_PARAM, self.api_key.as_str())],
        );
        get(url, "channels")
    }

    /// `GET <base>/de.pinuts.cmsbs.restapi.NewsletterQueue/status/<id>?umopen=<key>`
    pub fn build_status(&self, event_id: &str) -> HttpRequest {
        let segment = encode_segment(event_id);
        let url = build_url(
            &self.base_url,
            &[NEWSLETTER_PATH, "NewsletterQueue/status/", segment.as_str()],
            &[(NEWSLETTER_KEY_PARAM, self.api_key.as_str())],
        );
        get(url, "status")
    }

    /// `POST <base>/de.pinuts.cmsbs.restsend.EventFile/?open=<key>` with the
    /// XML-encoded event as body.
    pub fn build_event(&self, event: &Event) -> Result<HttpRequest, EncodingError> {
        let body = to_xml(event)?;
        let url = build_url(&self.base_url, &[EVENT_FILE_PATH], &[(EVENT_FILE_KEY_PARAM, self.api_key.as_str())]);
        let request = HttpRequest {
            method: HttpMethod::Post,
            url,
            headers: vec![
                ("Content-Type".to_string(), XML_CONTENT_TYPE.to_string()),
                (API_METHOD_HEADER.to_string(), "event".to_string()),
            ],
            body: Some(body),
        };
        log_request(&request, "event");
        Ok(request)
    }

    pub fn parse_channels(
        &self,
        request: &HttpRequest,
        response: HttpResponse,
    ) -> Result<NewsletterChannelCollection, ApiError> {
        let response = check_response(request, response)?;
        Ok(decode_collection(&response.body)?)
    }

    /// `Ok(None)` when the service answered with an empty body.
    pub fn parse_status(
        &self,
        request: &HttpRequest,
        response: HttpResponse,
    ) -> Result<Option<NewsletterStatus>, ApiError> {
        let response = check_response(request, response)?;
        Ok(decode_entity(&response.body)?)
    }

    /// `true` when the service accepted the event (status below 300).
    pub fn parse_event(&self, request: &HttpRequest, response: HttpResponse) -> Result<bool, ApiError> {
        let response = check_response(request, response)?;
        Ok(response.status < 300)
    }
}

impl fmt::Debug for MessengerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessengerClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .finish()
    }
}

fn get(url: String, operation: &str) -> HttpRequest {
    let request = HttpRequest {
        method: HttpMethod::Get,
        url,
        headers: vec![(API_METHOD_HEADER.to_string(), operation.to_string())],
        body: None,
    };
    log_request(&request, operation);
    request
}

fn log_request(request: &HttpRequest, operation: &str) {
    let url = redact_param(&redact_param(&request.url, NEWSLETTER_KEY_PARAM), EVENT_FILE_KEY_PARAM);
    tracing::debug!(method = request.method.as_str(), operation, %url, "built request");
}

fn check_response(request: &HttpRequest, response: HttpResponse) -> Result<HttpResponse, ApiError> {
    tracing::debug!(status = response.status, "received response");
    Ok(classify(request, response)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::EventRequestBuilder;
    use crate::error::ServiceCause;

    fn client() -> MessengerClient {
        MessengerClient::new("https://um.example.com", "KEY")
    }

    #[test]
    fn build_channels_produces_correct_request() {
        let req = client().build_channels();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "https://um.example.com/de.pinuts.cmsbs.restapi.Channels/index?umopen=KEY"
        );
        assert_eq!(req.header(API_METHOD_HEADER), Some("channels"));
        assert!(req.body.is_none());
    }

    #[test]
    fn build_status_embeds_encoded_event_id() {
        let req = client().build_status("EVT 1/2");
        assert_eq!(
            req.url,
            "https://um.example.com/de.pinuts.cmsbs.restapi.NewsletterQueue/status/EVT%201%2F2?umopen=KEY"
        );
        assert_eq!(req.header(API_METHOD_HEADER), Some("status"));
    }

    #[test]
    fn build_event_posts_xml() {
        let mut builder = EventRequestBuilder::new();
        builder.set_event_details(Some("EVT-1"), None, None);
        let req = client().build_event(&builder.build().unwrap()).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://um.example.com/de.pinuts.cmsbs.restsend.EventFile/?open=KEY");
        assert_eq!(req.header("content-type"), Some(XML_CONTENT_TYPE));
        assert_eq!(req.header(API_METHOD_HEADER), Some("event"));
        assert_eq!(
            req.body.as_deref(),
            Some(r#"<?xml version="1.0" encoding="UTF-8"?><event id="EVT-1"/>"#)
        );
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = MessengerClient::new("https://um.example.com/", "KEY");
        assert_eq!(client.base_url(), "https://um.example.com");
        assert!(client.build_channels().url.starts_with("https://um.example.com/de.pinuts"));
    }

    #[test]
    fn empty_api_key_leaves_no_query() {
        let client = MessengerClient::new("https://um.example.com", "");
        assert_eq!(
            client.build_channels().url,
            "https://um.example.com/de.pinuts.cmsbs.restapi.Channels/index"
        );
    }

    #[test]
    fn parse_channels_success() {
        let c = client();
        let req = c.build_channels();
        let body = r#"[{"id":"1","title":"News","isPublic":true},{"id":"2","title":"VIP","isVChannel":true}]"#;
        let channels = c.parse_channels(&req, HttpResponse::new(200, body)).unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels.get(0).unwrap().title, "News");
        assert!(channels.get(1).unwrap().is_vchannel);
    }

    #[test]
    fn parse_channels_bad_json() {
        let c = client();
        let req = c.build_channels();
        let err = c.parse_channels(&req, HttpResponse::new(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Service(ServiceCause::Decoding(_))));
    }

    #[test]
    fn parse_status_empty_body_is_none() {
        let c = client();
        let req = c.build_status("EVT-1");
        assert_eq!(c.parse_status(&req, HttpResponse::new(200, "")).unwrap(), None);
    }

    #[test]
    fn parse_status_unauthorized() {
        let c = client();
        let req = c.build_status("EVT-1");
        let err = c.parse_status(&req, HttpResponse::new(401, "")).unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
        assert!(err.to_string().contains("API key"));
        assert_eq!(err.failure().unwrap().request, req);
    }

    #[test]
    fn parse_event_success_boundary() {
        let c = client();
        let req = c.build_event(&Event::new()).unwrap();
        for status in [200, 201, 299] {
            assert!(c.parse_event(&req, HttpResponse::new(status, "")).unwrap(), "{status}");
        }
        assert!(!c.parse_event(&req, HttpResponse::new(302, "")).unwrap());
    }

    #[test]
    fn parse_event_unprocessable_entity() {
        let c = client();
        let req = c.build_event(&Event::new()).unwrap();
        let response = HttpResponse::new(422, r#"{"email": ["invalid", "missing"]}"#);
        let err = c.parse_event(&req, response).unwrap_err();
        assert!(matches!(err, ApiError::DetailedService(_)));
        assert_eq!(err.to_string(), r#"The entity "email" failed with "invalid" or "missing"."#);
    }

    #[test]
    fn parse_event_server_error_is_service_error() {
        let c = client();
        let req = c.build_event(&Event::new()).unwrap();
        let err = c.parse_event(&req, HttpResponse::new(507, "")).unwrap_err();
        assert!(matches!(err, ApiError::Service(ServiceCause::Http(_))));
        assert_eq!(err.status(), Some(507));
    }

    #[test]
    fn debug_hides_api_key() {
        assert!(!format!("{:?}", client()).contains("KEY"));
    }
}
