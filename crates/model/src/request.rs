use serde::{Deserialize, Serialize};

/// A request to be sent to the model provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelRequest {
    /// The system preamble describing the assistant persona.
    pub system_instruction: Option<String>,
    /// Prior turns of the conversation, oldest first.
    pub history: Vec<ModelMessage>,
    /// The new user message.
    pub message: String,
}

/// A complete message from the conversation history.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "text", rename_all = "lowercase")]
pub enum ModelMessage {
    /// A user input text.
    User(String),
    /// A text produced by the model.
    Model(String),
}

impl ModelMessage {
    /// Returns the text of this message.
    #[inline]
    pub fn text(&self) -> &str {
        match self {
            ModelMessage::User(text) | ModelMessage::Model(text) => text,
        }
    }
}
