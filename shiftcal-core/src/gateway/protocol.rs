//! Defines the JSON protocol used for communication between shiftcal and
//! calendar provider binaries over stdin/stdout.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::event::{CalendarInfo, EventDraft, EventMatch, TaggedEvent};

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    ListCalendars,
    InsertEvent,
    EventExists,
    DeleteEvent,
    QueryByTitle,
    ListTagged,
}

/// Request sent from shiftcal to provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from provider to shiftcal.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> String {
        serde_json::to_string(&Response::Success { data }).unwrap_or_else(|e| {
            Response::<()>::error(&format!("Failed to serialize response: {}", e))
        })
    }
}

impl Response<()> {
    pub fn error(msg: &str) -> String {
        serde_json::to_string(&Response::<()>::Error {
            error: msg.to_string(),
        })
        .unwrap_or_default()
    }
}

/// Fields the commands below own. Provider config keys with these names
/// would collide with them once flattened into the params.
pub const RESERVED_PARAMS: &[&str] = &["calendar_id", "event", "event_id", "title", "title_prefix"];

/// List the calendars the provider can write to.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListCalendars {
    #[serde(flatten)]
    pub provider_config: serde_json::Map<String, serde_json::Value>,
}

impl ProviderCommand for ListCalendars {
    type Response = Vec<CalendarInfo>;
    fn command() -> Command {
        Command::ListCalendars
    }
}

/// Insert a new event; the provider answers with the id it assigned.
#[derive(Debug, Serialize, Deserialize)]
pub struct InsertEvent {
    #[serde(flatten)]
    pub provider_config: serde_json::Map<String, serde_json::Value>,
    pub calendar_id: String,
    pub event: EventDraft,
}

impl ProviderCommand for InsertEvent {
    type Response = String;
    fn command() -> Command {
        Command::InsertEvent
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventExists {
    #[serde(flatten)]
    pub provider_config: serde_json::Map<String, serde_json::Value>,
    pub event_id: String,
}

impl ProviderCommand for EventExists {
    type Response = bool;
    fn command() -> Command {
        Command::EventExists
    }
}

/// Delete an event by id; `false` when the event was already gone.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteEvent {
    #[serde(flatten)]
    pub provider_config: serde_json::Map<String, serde_json::Value>,
    pub event_id: String,
}

impl ProviderCommand for DeleteEvent {
    type Response = bool;
    fn command() -> Command {
        Command::DeleteEvent
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryByTitle {
    #[serde(flatten)]
    pub provider_config: serde_json::Map<String, serde_json::Value>,
    pub calendar_id: String,
    pub title: String,
}

impl ProviderCommand for QueryByTitle {
    type Response = Vec<EventMatch>;
    fn command() -> Command {
        Command::QueryByTitle
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListTagged {
    #[serde(flatten)]
    pub provider_config: serde_json::Map<String, serde_json::Value>,
    pub calendar_id: String,
    pub title_prefix: String,
}

impl ProviderCommand for ListTagged {
    type Response = Vec<TaggedEvent>;
    fn command() -> Command {
        Command::ListTagged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let mut provider_config = serde_json::Map::new();
        provider_config.insert("local_dir".to_string(), "/tmp/cal".into());

        let cmd = EventExists {
            provider_config,
            event_id: "ev-1".to_string(),
        };
        let request = Request {
            command: EventExists::command(),
            params: serde_json::to_value(cmd).unwrap(),
        };

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();
        assert_eq!(json["command"], "event_exists");
        assert_eq!(json["params"]["event_id"], "ev-1");
        assert_eq!(json["params"]["local_dir"], "/tmp/cal");
    }

    #[test]
    fn test_response_variants() {
        let ok: Response<bool> = serde_json::from_str(&Response::success(true)).unwrap();
        assert!(matches!(ok, Response::Success { data: true }));

        let err: Response<bool> = serde_json::from_str(&Response::error("boom")).unwrap();
        match err {
            Response::Error { error } => assert_eq!(error, "boom"),
            Response::Success { .. } => panic!("expected error response"),
        }
    }
}
