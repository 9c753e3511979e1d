//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use folio_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: Vec<PresetEvent>,
    unfinished: bool,
    event_idx: usize,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };

        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;

            let idx = this.event_idx;
            this.event_idx += 1;
            if let Some(event) = this.events.get(idx) {
                return match event {
                    PresetEvent::MessageDelta(msg) => Poll::Ready(Ok(Some(
                        ModelResponseEvent::MessageDelta(msg.clone()),
                    ))),
                    PresetEvent::Error => Poll::Ready(Err(Error {
                        message: "stream interrupted",
                        kind: ErrorKind::Other,
                    })),
                };
            } else if idx == this.events.len() && !this.unfinished {
                return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                    ModelFinishReason::Stop,
                ))));
            } else {
                // In case this method is called after completion.
                return Poll::Ready(Ok(None));
            }
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

#[derive(Default)]
struct Shared {
    calls: AtomicUsize,
    last_request: Mutex<Option<ModelRequest>>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the conversation script, which
/// is how the model should respond to each turn. The preset is selected by
/// the number of completed turns in the request history (two messages per
/// turn). If there are no enough steps in the script, an error will be
/// returned.
///
/// Clones share the same call counter, so a test can keep a clone around
/// and inspect it after handing the provider to the code under test.
#[derive(Clone)]
pub struct TestModelProvider {
    script: Vec<PresetResponse>,
    delay: Option<Duration>,
    has_credential: bool,
    shared: Arc<Shared>,
}

impl Default for TestModelProvider {
    fn default() -> Self {
        Self {
            script: vec![],
            delay: None,
            has_credential: true,
            shared: Default::default(),
        }
    }
}

impl TestModelProvider {
    #[inline]
    pub fn add_turn(&mut self, preset: PresetResponse) {
        self.script.push(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Makes the provider report a missing credential.
    #[inline]
    pub fn without_credential(mut self) -> Self {
        self.has_credential = false;
        self
    }

    /// Returns how many times `send_request` has been called.
    #[inline]
    pub fn call_count(&self) -> usize {
        self.shared.calls.load(Ordering::SeqCst)
    }

    /// Returns the most recent request received by the provider.
    pub fn last_request(&self) -> Option<ModelRequest> {
        self.shared
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn has_credential(&self) -> bool {
        self.has_credential
    }

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        self.shared.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .shared
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(req.clone());

        let turn_idx = req.history.len() / 2;
        let result = match self.script.get(turn_idx) {
            None => Err(Error {
                message: "no enough steps",
                kind: ErrorKind::Other,
            }),
            Some(preset) if preset.rejected => Err(Error {
                message: "request rejected",
                kind: ErrorKind::Other,
            }),
            Some(preset) => Ok(TestModelResponse {
                events: preset.events.clone(),
                unfinished: preset.unfinished,
                event_idx: 0,
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                sleep: None,
            }),
        };
        ready(result)
    }
}
