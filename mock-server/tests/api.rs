use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Channel, QueueStatus, DEFAULT_API_KEY};
use tower::ServiceExt;

const CHANNELS: &str = "/de.pinuts.cmsbs.restapi.Channels/index";
const STATUS: &str = "/de.pinuts.cmsbs.restapi.NewsletterQueue/status";
const EVENT_FILE: &str = "/de.pinuts.cmsbs.restsend.EventFile/";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get_request(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn xml_request(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "text/xml; charset=UTF-8")
        .body(body.to_string())
        .unwrap()
}

fn event_uri() -> String {
    format!("{EVENT_FILE}?open={DEFAULT_API_KEY}")
}

// --- channels ---

#[tokio::test]
async fn list_channels_returns_seeded_channels() {
    let resp = app()
        .oneshot(get_request(&format!("{CHANNELS}?umopen={DEFAULT_API_KEY}")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let channels: Vec<Channel> = body_json(resp).await;
    assert_eq!(channels.len(), 3);
    assert!(channels.iter().any(|c| c.is_vchannel));
}

#[tokio::test]
async fn list_channels_without_key_returns_401() {
    let resp = app().oneshot(get_request(CHANNELS)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn list_channels_with_wrong_key_returns_401() {
    let resp = app()
        .oneshot(get_request(&format!("{CHANNELS}?umopen=wrong")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- status ---

#[tokio::test]
async fn unknown_status_returns_404() {
    let resp = app()
        .oneshot(get_request(&format!("{STATUS}/nope?umopen={DEFAULT_API_KEY}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- event file ---

#[tokio::test]
async fn event_with_newsletter_key_param_returns_401() {
    let resp = app()
        .oneshot(xml_request(&format!("{EVENT_FILE}?umopen={DEFAULT_API_KEY}"), "<event/>"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn event_as_json_returns_415() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(event_uri())
                .header(http::header::CONTENT_TYPE, "application/json")
                .body("{}".to_string())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn empty_event_returns_param_missing() {
    let resp = app().oneshot(xml_request(&event_uri(), "")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"], "param-missing");
    assert_eq!(body["description"], "event");
}

#[tokio::test]
async fn malformed_event_returns_422() {
    let resp = app()
        .oneshot(xml_request(&event_uri(), "<message/>"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = body_json(resp).await;
    assert!(body["event"].is_array());
}

// --- full submit/status lifecycle ---

#[tokio::test]
async fn submit_then_status_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();
    let event = r#"<?xml version="1.0" encoding="UTF-8"?><event id="EVT-7" skipUsedIDs="true"><destination><channel>customers</channel></destination></event>"#;

    // submit
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(xml_request(&event_uri(), event))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());

    // status
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request(&format!("{STATUS}/EVT-7?umopen={DEFAULT_API_KEY}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let status: QueueStatus = body_json(resp).await;
    assert_eq!(status.event_id, "EVT-7");
    assert_eq!(status.counted, 830);
    assert!(status.in_queue);
    assert_eq!(status.send_date.len(), "2018-11-12|13:45:24".len());
    assert_eq!(&status.send_date[10..11], "|");

    // resubmitting a used id with skipUsedIDs is a conflict
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(xml_request(&event_uri(), event))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}
