use folio_core::{View, Widget, WidgetBuilder, WidgetClosedError};
use folio_model::ModelProvider;

/// The system preamble describing the assistant and what it may discuss.
pub const PERSONA: &str = include_str!("./persona.md");

/// The line shown when the chat opens.
pub const GREETING: &str = "Hi! I'm Dauda's AI Assistant. Ask me about his \
     projects, skills, or availability.";

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    widget_builder: WidgetBuilder,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider, using
    /// the built-in persona and greeting.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        let widget_builder = WidgetBuilder::with_model_provider(provider)
            .with_preamble(PERSONA)
            .with_greeting(GREETING);
        Self { widget_builder }
    }

    /// Replaces the built-in persona.
    #[inline]
    pub fn with_persona<S: Into<String>>(mut self, persona: S) -> Self {
        self.widget_builder = self.widget_builder.with_preamble(persona);
        self
    }

    /// Replaces the built-in greeting.
    #[inline]
    pub fn with_greeting<S: Into<String>>(mut self, greeting: S) -> Self {
        self.widget_builder = self.widget_builder.with_greeting(greeting);
        self
    }

    /// Attaches a callback to be invoked when the session is idle.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.widget_builder = self.widget_builder.on_idle(on_idle);
        self
    }

    /// Attaches a callback to be invoked when the view changes.
    #[inline]
    pub fn on_change(
        mut self,
        on_change: impl Fn(&View) + Send + Sync + 'static,
    ) -> Self {
        self.widget_builder = self.widget_builder.on_change(on_change);
        self
    }

    /// Builds a new session.
    pub fn build(self) -> Session {
        Session {
            widget: self.widget_builder.build(),
        }
    }
}

/// A chat session, like a window that displays messages and has a input box.
///
/// It is basically a wrapper around [`Widget`] with the assistant persona
/// applied.
pub struct Session {
    widget: Widget,
}

impl Session {
    /// Sends a message to the session.
    #[inline]
    pub fn send_message(
        &self,
        message: &str,
    ) -> Result<(), WidgetClosedError> {
        self.widget.submit(message)
    }

    /// Returns what the session currently displays.
    #[inline]
    pub async fn snapshot(&self) -> Result<View, WidgetClosedError> {
        self.widget.snapshot().await
    }
}
