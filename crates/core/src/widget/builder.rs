use folio_model::ModelProvider;

use super::Widget;
use crate::model_client::ModelClient;
use crate::view::View;

pub(crate) type ChangeFn = Box<dyn Fn(&View) + Send + Sync>;
pub(crate) type IdleFn = Box<dyn Fn() + Send + Sync>;

/// [`Widget`] builder.
pub struct WidgetBuilder {
    pub(crate) model_client: ModelClient,
    pub(crate) preamble: Option<String>,
    pub(crate) greeting: Option<String>,
    pub(crate) on_change: Vec<ChangeFn>,
    pub(crate) on_idle: Option<IdleFn>,
}

impl WidgetBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            preamble: None,
            greeting: None,
            on_change: vec![],
            on_idle: None,
        }
    }

    /// Sets the system preamble sent with every request.
    #[inline]
    pub fn with_preamble<S: Into<String>>(mut self, preamble: S) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    /// Sets the greeting shown above the conversation.
    ///
    /// The greeting is only displayed. It is not part of the conversation
    /// and is never sent to the model.
    #[inline]
    pub fn with_greeting<S: Into<String>>(mut self, greeting: S) -> Self {
        self.greeting = Some(greeting.into());
        self
    }

    /// Attaches a callback to be invoked with the new view whenever the
    /// conversation or the request state changes.
    ///
    /// Callbacks run on the widget task and should return quickly.
    #[inline]
    pub fn on_change(
        mut self,
        on_change: impl Fn(&View) + Send + Sync + 'static,
    ) -> Self {
        self.on_change.push(Box::new(on_change));
        self
    }

    /// Attaches a callback to be invoked when a reply has been appended and
    /// the widget accepts input again.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.on_idle = Some(Box::new(on_idle));
        self
    }

    /// Builds the widget and starts its task.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    #[inline]
    pub fn build(self) -> Widget {
        Widget::spawn_from_builder(self)
    }
}
