mod builder;
mod state;

use std::error::Error;
use std::fmt;

use tokio::sync::{mpsc, oneshot};
use tracing::Instrument;

pub use builder::WidgetBuilder;
use state::{Command, WidgetState, run_widget};
pub use state::RequestState;

use crate::view::View;

/// A chat widget instance, which owns a conversation log, a request state
/// and the dispatcher that talks to the model.
///
/// All mutations happen on one task, in the order commands are sent, so
/// the handle can be cloned and used from anywhere. Only one request is in
/// flight at a time: input submitted while a reply is pending is dropped,
/// just as a disabled input box would drop it.
///
/// The conversation lives as long as at least one handle does.
#[derive(Clone)]
pub struct Widget {
    command_tx: mpsc::UnboundedSender<Command>,
}

impl Widget {
    /// Submits a user input.
    ///
    /// Blank input, and input arriving while a reply is pending, are
    /// ignored silently.
    pub fn submit<S: Into<String>>(
        &self,
        text: S,
    ) -> Result<(), WidgetClosedError> {
        self.command_tx
            .send(Command::Submit(text.into()))
            .map_err(|_| WidgetClosedError)
    }

    /// Returns the current view, after every command sent before it has
    /// been handled.
    pub async fn snapshot(&self) -> Result<View, WidgetClosedError> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(Command::Snapshot(tx))
            .map_err(|_| WidgetClosedError)?;
        rx.await.map_err(|_| WidgetClosedError)
    }
}

impl Widget {
    fn spawn_from_builder(builder: WidgetBuilder) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let state = WidgetState::from_builder(builder);
        tokio::spawn(
            run_widget(state, command_rx, command_tx.downgrade())
                .instrument(trace_span!("widget")),
        );
        Self { command_tx }
    }
}

/// The error returned when the widget task is no longer running.
pub struct WidgetClosedError;

impl fmt::Debug for WidgetClosedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetClosedError").finish()
    }
}

impl fmt::Display for WidgetClosedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the widget has been closed")
    }
}

impl Error for WidgetClosedError {}
