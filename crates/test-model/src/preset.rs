use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    /// The stream breaks at this point.
    #[serde(rename = "error")]
    Error,
}

/// The preset response for a model turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request itself fails before any event is streamed.
    #[serde(default)]
    pub rejected: bool,
    /// If set, the stream ends after the events without completing.
    #[serde(default)]
    pub unfinished: bool,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            rejected: false,
            unfinished: false,
        }
    }

    /// Creates a `PresetResponse` streaming the given text as one delta.
    #[inline]
    pub fn with_text<S: Into<String>>(text: S) -> Self {
        Self::with_events([PresetEvent::MessageDelta(text.into())])
    }

    /// Creates a `PresetResponse` whose request always fails.
    #[inline]
    pub fn rejected() -> Self {
        Self {
            events: vec![],
            rejected: true,
            unfinished: false,
        }
    }

    /// Makes the stream stop after its events without a finish reason, as
    /// a dropped connection would.
    #[inline]
    pub fn unfinished(mut self) -> Self {
        self.unfinished = true;
        self
    }
}
