//! Classification of HTTP error responses.
//!
//! # Design
//! `classify` is a pure decision function run once per response. Statuses
//! below 400 pass through untouched. Everything else becomes an
//! [`HttpFailure`] whose [`FailureKind`] drives the mapping onto the public
//! error kinds; the first matching rule wins:
//!
//! | status                  | kind               | message                      |
//! |-------------------------|--------------------|------------------------------|
//! | 507                     | `StorageExhausted` | storage text                 |
//! | other 5xx               | `Server`           | reason phrase                |
//! | 401                     | `Authentication`   | API key hint                 |
//! | 403, 409, 415           | `DetailedClient`   | fixed text per status        |
//! | 422 with JSON object    | `DetailedClient`   | first entry of the body      |
//! | 400 with `param-missing`| `DetailedClient`   | the body's `description`     |
//! | any other 4xx           | `Client`           | reason phrase                |

use serde_json::Value;

use crate::error::{FailureKind, HttpFailure};
use crate::http::{HttpRequest, HttpResponse};

const STORAGE_EXHAUSTED_MESSAGE: &str = "The request could not be processed because the account does not have \
                                         enough storage space (e.g. contacts, offers & projects or storage space).";
const AUTHENTICATION_MESSAGE: &str = "Authentication failed. Please check your API key.";
const FORBIDDEN_MESSAGE: &str = "The specified user does not have sufficient rights for the action.";
const CONFLICT_MESSAGE: &str = "The request was made under false assumptions. For example, if the resource has \
                                been changed in the meantime.";
const UNSUPPORTED_MEDIA_TYPE_MESSAGE: &str = "The content of the request was submitted with an invalid or not \
                                              allowed media type. Only .json is supported.";

/// Pass a successful response through, or classify an error response.
pub fn classify(request: &HttpRequest, response: HttpResponse) -> Result<HttpResponse, HttpFailure> {
    let status = response.status;
    if status < 400 {
        return Ok(response);
    }

    let (kind, message) = match status {
        507 => (FailureKind::StorageExhausted, STORAGE_EXHAUSTED_MESSAGE.to_string()),
        500.. => (FailureKind::Server, response.reason.clone()),
        401 => (FailureKind::Authentication, AUTHENTICATION_MESSAGE.to_string()),
        403 => (FailureKind::DetailedClient, FORBIDDEN_MESSAGE.to_string()),
        409 => (FailureKind::DetailedClient, CONFLICT_MESSAGE.to_string()),
        415 => (FailureKind::DetailedClient, UNSUPPORTED_MEDIA_TYPE_MESSAGE.to_string()),
        422 => match unprocessable_entity_message(&response.body) {
            Some(message) => (FailureKind::DetailedClient, message),
            None => (FailureKind::Client, response.reason.clone()),
        },
        400 => match param_missing_message(&response.body) {
            Some(message) => (FailureKind::DetailedClient, message),
            None => (FailureKind::Client, response.reason.clone()),
        },
        _ => (FailureKind::Client, response.reason.clone()),
    };

    tracing::warn!(status, %kind, %message, "request failed");

    Err(HttpFailure {
        kind,
        message,
        request: request.clone(),
        response,
    })
}

/// `{"email": ["invalid", "missing"]}` reads as
/// `The entity "email" failed with "invalid" or "missing".`
fn unprocessable_entity_message(body: &str) -> Option<String> {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return None;
    };
    let (key, value) = map.iter().next()?;
    let detail = match value {
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join("\" or \""),
        other => display_value(other),
    };
    Some(format!("The entity \"{key}\" failed with \"{detail}\"."))
}

fn param_missing_message(body: &str) -> Option<String> {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return None;
    };
    if map.get("error").and_then(Value::as_str) != Some("param-missing") {
        return None;
    }
    let description = map.get("description").map(display_value).unwrap_or_default();
    Some(format!("Request failed with \"{description}\"."))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
