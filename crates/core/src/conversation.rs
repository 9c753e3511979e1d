//! Conversation-related types.

use chrono::{DateTime, Utc};
use folio_model::ModelMessage;

/// Who sent a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The person typing into the widget.
    User,
    /// The language model, or a fallback standing in for it.
    Model,
}

/// A single entry in the conversation.
///
/// Messages are immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    role: Role,
    text: String,
    timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a user message stamped with the current time.
    #[inline]
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self::new(Role::User, text)
    }

    /// Creates a model message stamped with the current time.
    #[inline]
    pub fn model<S: Into<String>>(text: S) -> Self {
        Self::new(Role::Model, text)
    }

    fn new<S: Into<String>>(role: Role, text: S) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Returns the sender role.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the message text.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns when the message was created.
    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub(crate) fn to_model_message(&self) -> ModelMessage {
        match self.role {
            Role::User => ModelMessage::User(self.text.clone()),
            Role::Model => ModelMessage::Model(self.text.clone()),
        }
    }
}

/// An append-only log of messages, in the order they arrived.
#[derive(Clone, Default, Debug)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Adds a message to the end of the log.
    #[inline]
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Returns the messages in arrival order.
    #[inline]
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if nothing has been said yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Checks a raw user input before it enters the conversation.
///
/// Blank input yields `None`. Anything else is kept exactly as typed.
pub fn accept_user_input(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_order() {
        let mut conversation = Conversation::default();
        assert!(conversation.is_empty());

        conversation.append(Message::user("Hello"));
        conversation.append(Message::model("Hi there"));
        conversation.append(Message::user("Tell me about Academia"));

        let texts: Vec<_> =
            conversation.snapshot().iter().map(Message::text).collect();
        assert_eq!(texts, ["Hello", "Hi there", "Tell me about Academia"]);
        assert_eq!(conversation.len(), 3);

        let stamps: Vec<_> = conversation
            .snapshot()
            .iter()
            .map(Message::timestamp)
            .collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_accept_user_input() {
        assert_eq!(accept_user_input(""), None);
        assert_eq!(accept_user_input("  \t\n"), None);
        assert_eq!(
            accept_user_input(" Hello "),
            Some(" Hello ".to_owned())
        );
    }

    #[test]
    fn test_to_model_message() {
        assert_eq!(
            Message::user("Hi").to_model_message(),
            ModelMessage::User("Hi".to_owned())
        );
        assert_eq!(
            Message::model("Hey").to_model_message(),
            ModelMessage::Model("Hey".to_owned())
        );
    }
}
