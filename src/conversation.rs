use crate::api::models::{ChatMessage, MessageOrigin};

/// A send we have echoed locally and not yet seen a reply for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwaitingReply {
    pub agent: Option<String>,
}

/// The ordered message list behind one chat screen.
///
/// Ordering is append order. Nothing is reconciled, deduplicated or
/// renumbered: a reply delivered twice is shown twice.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    awaiting: Option<AwaitingReply>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one message. A local echo arms the pending indicator for its
    /// routing tag; any remote or error message clears it.
    pub fn push(&mut self, msg: ChatMessage) {
        match msg.origin {
            MessageOrigin::User => {
                self.awaiting = Some(AwaitingReply {
                    agent: msg.agent.clone(),
                });
            }
            MessageOrigin::Agent | MessageOrigin::Error => {
                self.awaiting = None;
            }
        }
        self.messages.push(msg);
    }

    /// Replace the list with fetched history. The pending indicator is
    /// screen-transient state and is left alone.
    pub fn load_history(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn awaiting(&self) -> Option<&AwaitingReply> {
        self.awaiting.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::PendingResponse;

    fn remote(text: &str, agent: Option<&str>) -> ChatMessage {
        ChatMessage::from(PendingResponse {
            message: text.to_string(),
            timestamp: "2026-08-08T12:00:00".to_string(),
            agent: agent.map(str::to_string),
        })
    }

    #[test]
    fn local_echo_is_appended_immediately() {
        let mut conv = Conversation::new();
        conv.push(ChatMessage::sent("hello", Some("researcher".into())));
        assert_eq!(conv.messages().len(), 1);
        assert_eq!(conv.messages()[0].origin, MessageOrigin::User);
        assert_eq!(conv.messages()[0].text, "hello");
        assert!(conv.awaiting().is_some());
    }

    #[test]
    fn indicator_carries_the_routing_tag() {
        let mut conv = Conversation::new();
        conv.push(ChatMessage::sent("hello", Some("researcher".into())));
        assert_eq!(
            conv.awaiting().and_then(|a| a.agent.as_deref()),
            Some("researcher")
        );
    }

    #[test]
    fn send_failure_appends_one_error_and_clears_indicator() {
        let mut conv = Conversation::new();
        conv.push(ChatMessage::sent("hello", None));
        conv.push(ChatMessage::failure("Message not sent: connection refused"));
        assert_eq!(conv.messages().len(), 2);
        assert_eq!(conv.messages()[1].origin, MessageOrigin::Error);
        assert!(conv.awaiting().is_none());
    }

    #[test]
    fn pending_batch_appends_in_order_and_first_reply_clears_indicator() {
        let mut conv = Conversation::new();
        conv.push(ChatMessage::sent("hello", None));
        conv.push(remote("first", None));
        assert!(conv.awaiting().is_none());
        conv.push(remote("second", None));
        let texts: Vec<&str> = conv.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["hello", "first", "second"]);
    }

    #[test]
    fn send_then_poll_scenario() {
        let mut conv = Conversation::new();
        conv.push(ChatMessage::sent("hello", Some("researcher".into())));
        conv.push(remote("hi there", Some("researcher")));
        let msgs = conv.messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].origin, MessageOrigin::User);
        assert_eq!(msgs[0].text, "hello");
        assert_eq!(msgs[1].origin, MessageOrigin::Agent);
        assert_eq!(msgs[1].text, "hi there");
        assert_eq!(msgs[1].agent.as_deref(), Some("researcher"));
        assert!(conv.awaiting().is_none());
    }

    #[test]
    fn history_reload_leaves_indicator_untouched() {
        let mut conv = Conversation::new();
        conv.push(ChatMessage::sent("hello", None));
        conv.load_history(vec![remote("old reply", None)]);
        assert_eq!(conv.messages().len(), 1);
        assert!(conv.awaiting().is_some());
    }

    #[test]
    fn duplicate_deliveries_are_kept() {
        let mut conv = Conversation::new();
        conv.push(remote("hi", None));
        conv.push(remote("hi", None));
        assert_eq!(conv.messages().len(), 2);
    }
}
