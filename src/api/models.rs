use serde::Deserialize;

/// Where a rendered message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrigin {
    /// Typed locally and echoed before the server confirms anything.
    User,
    /// Produced asynchronously by a backend agent.
    Agent,
    /// Local failure report, never sent anywhere.
    Error,
}

impl MessageOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageOrigin::User => "user",
            MessageOrigin::Agent => "agent",
            MessageOrigin::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "agent" => Some(Self::Agent),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// One entry of the ordered message list. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub text: String,
    pub origin: MessageOrigin,
    pub timestamp: String,
    pub agent: Option<String>,
}

impl ChatMessage {
    /// Local echo of a just-submitted message.
    pub fn sent(text: impl Into<String>, agent: Option<String>) -> Self {
        Self {
            text: text.into(),
            origin: MessageOrigin::User,
            timestamp: chrono::Local::now().to_rfc3339(),
            agent,
        }
    }

    /// Inline failure report shown in place of the reply that never came.
    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: MessageOrigin::Error,
            timestamp: chrono::Local::now().to_rfc3339(),
            agent: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub username: String,
}

/// `GET /messages/history` item, oldest first.
#[derive(Debug, Deserialize)]
pub struct HistoryEntry {
    pub message: String,
    pub sender: String,
    pub timestamp: String,
    #[serde(default)]
    pub agent: Option<String>,
}

impl From<HistoryEntry> for ChatMessage {
    fn from(entry: HistoryEntry) -> Self {
        let origin = if entry.sender == "user" {
            MessageOrigin::User
        } else {
            MessageOrigin::Agent
        };
        Self {
            text: entry.message,
            origin,
            timestamp: entry.timestamp,
            agent: entry.agent,
        }
    }
}

/// `GET /messages/pending` body.
#[derive(Debug, Deserialize)]
pub struct PendingBatch {
    #[serde(default)]
    pub responses: Vec<PendingResponse>,
}

/// One asynchronously produced agent reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PendingResponse {
    pub message: String,
    pub timestamp: String,
    #[serde(default)]
    pub agent: Option<String>,
}

impl From<PendingResponse> for ChatMessage {
    fn from(response: PendingResponse) -> Self {
        Self {
            text: response.message,
            origin: MessageOrigin::Agent,
            timestamp: response.timestamp,
            agent: response.agent,
        }
    }
}

/// Parse one push-channel event payload. Anything that is not the JSON
/// message shape counts as a keep-alive and yields `None`.
pub fn parse_stream_event(data: &str) -> Option<PendingResponse> {
    serde_json::from_str(data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_event_parses_message_payload() {
        let parsed =
            parse_stream_event(r#"{"message":"hi there","timestamp":"T1","agent":"researcher"}"#)
                .expect("message payload should parse");
        assert_eq!(parsed.message, "hi there");
        assert_eq!(parsed.timestamp, "T1");
        assert_eq!(parsed.agent.as_deref(), Some("researcher"));
    }

    #[test]
    fn malformed_stream_events_are_keep_alives() {
        assert!(parse_stream_event("ping").is_none());
        assert!(parse_stream_event("{}").is_none());
        assert!(parse_stream_event(r#"{"unrelated":true}"#).is_none());
        assert!(parse_stream_event("").is_none());
    }

    #[test]
    fn stream_event_tolerates_missing_agent() {
        let parsed = parse_stream_event(r#"{"message":"hi","timestamp":"T1"}"#)
            .expect("agent field is optional");
        assert!(parsed.agent.is_none());
    }

    #[test]
    fn history_sender_maps_to_origin() {
        let user: ChatMessage = HistoryEntry {
            message: "hello".into(),
            sender: "user".into(),
            timestamp: "T0".into(),
            agent: None,
        }
        .into();
        assert_eq!(user.origin, MessageOrigin::User);

        let bot: ChatMessage = HistoryEntry {
            message: "hi there".into(),
            sender: "bot".into(),
            timestamp: "T1".into(),
            agent: Some("researcher".into()),
        }
        .into();
        assert_eq!(bot.origin, MessageOrigin::Agent);
        assert_eq!(bot.agent.as_deref(), Some("researcher"));
    }

    #[test]
    fn pending_batch_defaults_to_empty() {
        let batch: PendingBatch = serde_json::from_str("{}").expect("empty body is a valid batch");
        assert!(batch.responses.is_empty());
    }

    #[test]
    fn origin_round_trips_through_its_string_form() {
        for origin in [MessageOrigin::User, MessageOrigin::Agent, MessageOrigin::Error] {
            assert_eq!(MessageOrigin::parse(origin.as_str()), Some(origin));
        }
        assert_eq!(MessageOrigin::parse("system"), None);
    }
}
