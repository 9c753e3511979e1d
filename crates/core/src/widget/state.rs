use std::fmt::{self, Debug};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::WidgetBuilder;
use super::builder::{ChangeFn, IdleFn};
use crate::conversation::{Conversation, Message, accept_user_input};
use crate::dispatcher::Dispatcher;
use crate::view::View;

/// Whether a reply is being waited for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RequestState {
    /// New input is accepted.
    #[default]
    Idle,
    /// One request is outstanding and new input is dropped.
    Pending,
}

pub(crate) enum Command {
    Submit(String),
    Snapshot(oneshot::Sender<View>),
    ReplyArrived(Message),
}

impl Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Submit(text) => {
                f.debug_tuple("Submit").field(text).finish()
            }
            Command::Snapshot(_) => f.write_str("Snapshot"),
            Command::ReplyArrived(msg) => {
                f.debug_tuple("ReplyArrived").field(msg).finish()
            }
        }
    }
}

pub(crate) struct WidgetState {
    conversation: Conversation,
    request_state: RequestState,
    dispatcher: Dispatcher,
    greeting: Option<String>,
    in_flight: Option<JoinHandle<()>>,

    on_change: Vec<ChangeFn>,
    on_idle: Option<IdleFn>,
}

impl WidgetState {
    pub fn from_builder(builder: WidgetBuilder) -> Self {
        let WidgetBuilder {
            model_client,
            preamble,
            greeting,
            on_change,
            on_idle,
        } = builder;

        Self {
            conversation: Default::default(),
            request_state: Default::default(),
            dispatcher: Dispatcher::with_client(model_client, preamble),
            greeting,
            in_flight: None,
            on_change,
            on_idle,
        }
    }

    fn submit(
        &mut self,
        text: String,
        command_tx: &mpsc::WeakUnboundedSender<Command>,
    ) {
        let Some(text) = accept_user_input(&text) else {
            trace!("ignored blank input");
            return;
        };
        if self.request_state == RequestState::Pending {
            debug!("a reply is pending, input dropped");
            return;
        }

        // The history for this turn is everything said before it.
        let prior = self.conversation.snapshot().to_vec();
        self.conversation.append(Message::user(text.clone()));
        self.request_state = RequestState::Pending;
        self.notify_change();

        let dispatcher = self.dispatcher.clone();
        let command_tx = command_tx.clone();
        let task = tokio::spawn(
            async move {
                let reply = dispatcher.send(&text, &prior).await;
                match command_tx.upgrade() {
                    Some(command_tx) => {
                        command_tx.send(Command::ReplyArrived(reply)).ok();
                    }
                    None => debug!("widget closed, reply discarded"),
                }
            }
            .instrument(trace_span!("dispatch")),
        );
        self.in_flight = Some(task);
    }

    fn reply_arrived(&mut self, reply: Message) {
        if self.request_state != RequestState::Pending {
            warn!("got a reply with no request pending, discarded");
            return;
        }

        self.conversation.append(reply);
        self.request_state = RequestState::Idle;
        self.in_flight = None;
        self.notify_change();

        if let Some(on_idle) = &self.on_idle {
            on_idle();
        }
    }

    fn view(&self) -> View {
        View {
            greeting: self.greeting.clone(),
            messages: self.conversation.snapshot().to_vec(),
            typing: self.request_state == RequestState::Pending,
        }
    }

    fn notify_change(&self) {
        if self.on_change.is_empty() {
            return;
        }
        let view = self.view();
        for on_change in &self.on_change {
            on_change(&view);
        }
    }
}

impl Drop for WidgetState {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            debug!("aborting the pending request");
            task.abort();
        }
    }
}

pub(crate) async fn run_widget(
    mut state: WidgetState,
    mut command_rx: mpsc::UnboundedReceiver<Command>,
    command_tx: mpsc::WeakUnboundedSender<Command>,
) {
    debug!("started");
    // Only weak senders are held here, so the loop ends once every
    // `Widget` handle has been dropped.
    while let Some(command) = command_rx.recv().await {
        trace!("received command: {command:?}");
        match command {
            Command::Submit(text) => state.submit(text, &command_tx),
            Command::Snapshot(tx) => {
                tx.send(state.view()).ok();
            }
            Command::ReplyArrived(reply) => state.reply_arrived(reply),
        }
    }
    debug!("will terminate");
}
