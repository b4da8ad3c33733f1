//! In-memory emulation of the Universal Messenger endpoints used by the
//! client core: the newsletter JSON endpoints and the event-file XML upload.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use quick_xml::{
    events::{BytesRef, Event as XmlEvent},
    Reader,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const CHANNELS_PATH: &str = "/de.pinuts.cmsbs.restapi.Channels/index";
pub const STATUS_PATH: &str = "/de.pinuts.cmsbs.restapi.NewsletterQueue/status/{event_id}";
pub const EVENT_FILE_PATH: &str = "/de.pinuts.cmsbs.restsend.EventFile/";

/// API key accepted by [`app`].
pub const DEFAULT_API_KEY: &str = "test-key";

/// Format of `sendDate`, as the real service writes it.
pub const SEND_DATE_FORMAT: &str = "%Y-%m-%d|%H:%M:%S";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub title: String,
    pub description: String,
    pub is_public: bool,
    #[serde(rename = "isVChannel")]
    pub is_vchannel: bool,
    pub oid: String,
    pub estimated_count: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub event_id: String,
    pub oid: String,
    pub send_state: i64,
    pub send_date: String,
    pub contacted: i64,
    pub counted: i64,
    pub not_contacted: i64,
    pub in_queue: bool,
    pub is_failed: bool,
    pub is_finished: bool,
    pub is_stopped: bool,
}

/// What the server reads from an uploaded event document.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SubmittedEvent {
    pub id: Option<String>,
    pub skip_used_ids: bool,
    pub channels: Vec<String>,
}

pub type Db = Arc<RwLock<HashMap<String, QueueStatus>>>;

#[derive(Clone)]
struct AppState {
    api_key: Arc<str>,
    channels: Arc<Vec<Channel>>,
    db: Db,
}

/// Error responses in the shapes the real service uses.
#[derive(Debug)]
enum Rejection {
    Unauthorized,
    NotFound,
    Conflict,
    UnsupportedMediaType,
    ParamMissing(&'static str),
    Unprocessable(&'static str, String),
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Rejection::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Rejection::NotFound => StatusCode::NOT_FOUND.into_response(),
            Rejection::Conflict => StatusCode::CONFLICT.into_response(),
            Rejection::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response(),
            Rejection::ParamMissing(param) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "param-missing", "description": param })),
            )
                .into_response(),
            Rejection::Unprocessable(entity, reason) => {
                let mut body = serde_json::Map::new();
                body.insert(entity.to_string(), json!([reason]));
                (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
            }
        }
    }
}

pub fn app() -> Router {
    app_with_key(DEFAULT_API_KEY)
}

pub fn app_with_key(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        channels: Arc::new(seed_channels()),
        db: Arc::new(RwLock::new(HashMap::new())),
    };
    Router::new()
        .route(CHANNELS_PATH, get(list_channels))
        .route(STATUS_PATH, get(get_status))
        .route(EVENT_FILE_PATH, post(submit_event))
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_key(api_key)).await
}

fn seed_channels() -> Vec<Channel> {
    vec![
        Channel {
            id: "newsletter".to_string(),
            title: "Newsletter".to_string(),
            description: "Weekly newsletter".to_string(),
            is_public: true,
            is_vchannel: false,
            oid: "1001".to_string(),
            estimated_count: 1250,
        },
        Channel {
            id: "customers".to_string(),
            title: "Customers".to_string(),
            description: "Everybody who ordered in the shop".to_string(),
            is_public: false,
            is_vchannel: false,
            oid: "1002".to_string(),
            estimated_count: 830,
        },
        Channel {
            id: "vip".to_string(),
            title: "VIP".to_string(),
            description: "Customers with more than ten orders".to_string(),
            is_public: false,
            is_vchannel: true,
            oid: "1003".to_string(),
            estimated_count: 42,
        },
    ]
}

fn authorize(state: &AppState, params: &HashMap<String, String>, key_param: &str) -> Result<(), Rejection> {
    match params.get(key_param) {
        Some(key) if key.as_str() == &*state.api_key => Ok(()),
        _ => {
            tracing::debug!(key_param, "rejected request with missing or wrong api key");
            Err(Rejection::Unauthorized)
        }
    }
}

async fn list_channels(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Channel>>, Rejection> {
    authorize(&state, &params, "umopen")?;
    Ok(Json(state.channels.as_ref().clone()))
}

async fn get_status(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<QueueStatus>, Rejection> {
    authorize(&state, &params, "umopen")?;
    let db = state.db.read().await;
    db.get(&event_id).cloned().map(Json).ok_or(Rejection::NotFound)
}

async fn submit_event(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, Rejection> {
    authorize(&state, &params, "open")?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !is_xml_content_type(content_type) {
        return Err(Rejection::UnsupportedMediaType);
    }
    if body.trim().is_empty() {
        return Err(Rejection::ParamMissing("event"));
    }

    let submitted = parse_event(&body).map_err(|reason| Rejection::Unprocessable("event", reason))?;

    let mut db = state.db.write().await;
    if let Some(id) = &submitted.id {
        if submitted.skip_used_ids && db.contains_key(id) {
            return Err(Rejection::Conflict);
        }
    }

    let event_id = submitted.id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let counted: i64 = state
        .channels
        .iter()
        .filter(|channel| submitted.channels.contains(&channel.id))
        .map(|channel| channel.estimated_count)
        .sum();
    let status = QueueStatus {
        event_id: event_id.clone(),
        oid: (2000 + db.len()).to_string(),
        send_state: 1,
        send_date: chrono::Local::now().format(SEND_DATE_FORMAT).to_string(),
        contacted: 0,
        counted,
        not_contacted: counted,
        in_queue: true,
        is_failed: false,
        is_finished: false,
        is_stopped: false,
    };
    db.insert(event_id.clone(), status);
    tracing::info!(%event_id, counted, "accepted event");

    Ok(StatusCode::OK)
}

fn is_xml_content_type(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    mime.eq_ignore_ascii_case("text/xml") || mime.eq_ignore_ascii_case("application/xml")
}

/// Read the root `event` element's id and `skipUsedIDs` flag and the
/// addressed channels. The whole document must be well-formed.
pub fn parse_event(xml: &str) -> Result<SubmittedEvent, String> {
    let mut reader = Reader::from_str(xml);

    let mut submitted = SubmittedEvent::default();
    let mut seen_root = false;
    // Text of the `<channel>` being read; entities arrive as separate events.
    let mut channel: Option<String> = None;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            XmlEvent::Start(e) | XmlEvent::Empty(e) if !seen_root => {
                if e.name().as_ref() != b"event" {
                    return Err("root element must be <event>".to_string());
                }
                seen_root = true;
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| e.to_string())?;
                    let raw = std::str::from_utf8(&attr.value).map_err(|e| e.to_string())?;
                    let value = quick_xml::escape::unescape(raw).map_err(|e| e.to_string())?;
                    match attr.key.as_ref() {
                        b"id" => submitted.id = Some(value.into_owned()),
                        b"skipUsedIDs" => submitted.skip_used_ids = value == "true",
                        _ => {}
                    }
                }
            }
            XmlEvent::Start(e) => {
                channel = (e.name().as_ref() == b"channel").then(String::new);
            }
            XmlEvent::Text(text) => {
                if let Some(buf) = channel.as_mut() {
                    buf.push_str(&text.decode().map_err(|e| e.to_string())?);
                }
            }
            XmlEvent::CData(data) => {
                if let Some(buf) = channel.as_mut() {
                    buf.push_str(&data.decode().map_err(|e| e.to_string())?);
                }
            }
            XmlEvent::GeneralRef(entity) => {
                if let Some(buf) = channel.as_mut() {
                    buf.push_str(&resolve_entity(&entity)?);
                }
            }
            XmlEvent::End(_) => {
                if let Some(buf) = channel.take() {
                    let name = buf.trim();
                    if !name.is_empty() {
                        submitted.channels.push(name.to_string());
                    }
                }
            }
            XmlEvent::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err("document has no root element".to_string());
    }
    Ok(submitted)
}

fn resolve_entity(entity: &BytesRef<'_>) -> Result<String, String> {
    if let Some(ch) = entity.resolve_char_ref().map_err(|e| e.to_string())? {
        return Ok(ch.to_string());
    }
    let name = entity.decode().map_err(|e| e.to_string())?;
    quick_xml::escape::resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| format!("unknown entity &{name};"))
}
