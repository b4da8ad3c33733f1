//! One-call endpoint operations over a host-supplied [`Transport`].

use crate::client::MessengerClient;
use crate::config::Config;
use crate::error::ApiError;
use crate::event::Event;
use crate::http::Transport;
use crate::types::{NewsletterChannelCollection, NewsletterStatus};

/// Runs build, send and parse for each endpoint operation.
///
/// Every failure, whether raised by the transport, the encoder, the classifier
/// or the decoder, comes back as one of the three [`ApiError`] kinds.
#[derive(Debug, Clone)]
pub struct UniversalMessenger<T> {
    client: MessengerClient,
    transport: T,
}

impl<T: Transport> UniversalMessenger<T> {
    pub fn new(config: &Config, transport: T) -> Self {
        Self::with_client(MessengerClient::from_config(config), transport)
    }

    pub fn with_client(client: MessengerClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &MessengerClient {
        &self.client
    }

    /// All newsletter channels and virtual channels.
    pub fn list_channels(&self) -> Result<NewsletterChannelCollection, ApiError> {
        let request = self.client.build_channels();
        let response = self.transport.send(&request)?;
        self.client.parse_channels(&request, response)
    }

    /// Delivery status of the event, or `None` when the service has nothing
    /// to report.
    pub fn get_status(&self, event_id: &str) -> Result<Option<NewsletterStatus>, ApiError> {
        let request = self.client.build_status(event_id);
        let response = self.transport.send(&request)?;
        self.client.parse_status(&request, response)
    }

    /// Submit the event for dispatch. `Ok(true)` once the service accepted it.
    pub fn submit_event(&self, event: &Event) -> Result<bool, ApiError> {
        let request = self.client.build_event(event)?;
        let response = self.transport.send(&request)?;
        self.client.parse_event(&request, response)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::ServiceCause;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse, TransportError};

    /// Answers every request with a canned response and records what it saw.
    struct StubTransport {
        response: Result<HttpResponse, TransportError>,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl StubTransport {
        fn answering(status: u16, body: &str) -> Self {
            Self {
                response: Ok(HttpResponse::new(status, body)),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                response: Err(TransportError::new(message)),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for StubTransport {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.borrow_mut().push(request.clone());
            self.response.clone()
        }
    }

    fn messenger(transport: &StubTransport) -> UniversalMessenger<&StubTransport> {
        UniversalMessenger::new(&Config::new("https://um.example.com", "KEY"), transport)
    }

    #[test]
    fn list_channels_decodes_in_order() {
        let transport = StubTransport::answering(200, r#"[{"id":"a"},{"id":"b"},{"id":"c"}]"#);
        let channels = messenger(&transport).list_channels().unwrap();
        let ids: Vec<_> = channels.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(transport.seen.borrow()[0].method, HttpMethod::Get);
    }

    #[test]
    fn get_status_returns_entity() {
        let transport = StubTransport::answering(200, r#"{"eventId":"EVT-1","sendDate":"2018-11-12|13:45:24"}"#);
        let status = messenger(&transport).get_status("EVT-1").unwrap().unwrap();
        assert_eq!(status.event_id, "EVT-1");
        assert!(status.send_date.is_some());
        assert!(transport.seen.borrow()[0].url.contains("/status/EVT-1?"));
    }

    #[test]
    fn submit_event_posts_and_reports_acceptance() {
        let transport = StubTransport::answering(201, "");
        assert!(messenger(&transport).submit_event(&Event::new()).unwrap());
        let seen = transport.seen.borrow();
        assert_eq!(seen[0].method, HttpMethod::Post);
        assert!(seen[0].body.as_deref().unwrap().ends_with("<event/>"));
    }

    #[test]
    fn transport_failure_is_service_error() {
        let transport = StubTransport::failing("connection refused");
        let err = messenger(&transport).list_channels().unwrap_err();
        assert!(matches!(err, ApiError::Service(ServiceCause::Transport(_))));
    }

    #[test]
    fn classified_failures_surface_as_public_kinds() {
        let transport = StubTransport::answering(401, "");
        let err = messenger(&transport).get_status("x").unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));

        let transport = StubTransport::answering(403, "");
        let err = messenger(&transport).submit_event(&Event::new()).unwrap_err();
        assert!(matches!(err, ApiError::DetailedService(_)));

        let transport = StubTransport::answering(500, "");
        let err = messenger(&transport).list_channels().unwrap_err();
        assert!(matches!(err, ApiError::Service(ServiceCause::Http(_))));
        assert_eq!(err.to_string(), "Internal Server Error");
    }
}
