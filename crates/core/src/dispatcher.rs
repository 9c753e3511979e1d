use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use folio_model::{
    ModelFinishReason, ModelProvider, ModelProviderError, ModelRequest,
};

use crate::conversation::Message;
use crate::model_client::ModelClient;

/// Shown instead of a reply when no credential is configured.
pub const CONFIGURATION_MESSAGE: &str = "I can't connect to my creative \
     network right now: no API key has been configured.";

/// Shown instead of a reply when the model service fails.
pub const APOLOGY_MESSAGE: &str = "I seem to be having trouble connecting \
     to my creative network. Please try again later.";

/// Shown when the model answers with nothing.
pub const EMPTY_REPLY_MESSAGE: &str =
    "I'm pondering that, but have no words right now.";

#[derive(Debug)]
enum DispatchError {
    Configuration,
    Service(Box<dyn ModelProviderError>),
}

impl DispatchError {
    #[inline]
    fn fallback_text(&self) -> &'static str {
        match self {
            DispatchError::Configuration => CONFIGURATION_MESSAGE,
            DispatchError::Service(_) => APOLOGY_MESSAGE,
        }
    }
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Configuration => f.write_str("no credential"),
            DispatchError::Service(err) => {
                write!(f, "service error ({:?}): {err}", err.kind())
            }
        }
    }
}

impl Error for DispatchError {}

/// Turns one user turn into exactly one call to the model.
///
/// The dispatcher holds no conversation state: the prior log is passed in
/// on every call and sent along as history. It never fails; errors are
/// logged and folded into a fixed reply so the conversation can go on.
#[derive(Clone)]
pub struct Dispatcher {
    client: ModelClient,
    preamble: Option<Arc<str>>,
}

impl Dispatcher {
    /// Creates a dispatcher for the given provider and system preamble.
    pub fn new<P: ModelProvider + 'static>(
        provider: P,
        preamble: Option<String>,
    ) -> Self {
        Self::with_client(ModelClient::new(provider), preamble)
    }

    pub(crate) fn with_client(
        client: ModelClient,
        preamble: Option<String>,
    ) -> Self {
        Self {
            client,
            preamble: preamble.map(Arc::from),
        }
    }

    /// Sends `user_text` with `prior` as context, and returns the model
    /// message to append.
    ///
    /// `prior` must not contain the new user message itself.
    pub async fn send(&self, user_text: &str, prior: &[Message]) -> Message {
        match self.try_send(user_text, prior).await {
            Ok(text) => Message::model(text),
            Err(err) => {
                match &err {
                    DispatchError::Configuration => {
                        warn!("no credential configured, request skipped");
                    }
                    DispatchError::Service(inner) => {
                        error!(kind = ?inner.kind(), "request failed: {err}");
                    }
                }
                Message::model(err.fallback_text())
            }
        }
    }

    async fn try_send(
        &self,
        user_text: &str,
        prior: &[Message],
    ) -> Result<String, DispatchError> {
        if !self.client.has_credential() {
            return Err(DispatchError::Configuration);
        }

        let request = self.build_request(user_text, prior);
        debug!(history = request.history.len(), "sending request");
        let resp = self
            .client
            .send_request(request)
            .await
            .map_err(DispatchError::Service)?;
        if resp.finish_reason != ModelFinishReason::Stop {
            warn!(reason = ?resp.finish_reason, "model finished early");
        }

        if resp.text.trim().is_empty() {
            debug!("model returned an empty reply");
            return Ok(EMPTY_REPLY_MESSAGE.to_owned());
        }
        Ok(resp.text)
    }

    fn build_request(
        &self,
        user_text: &str,
        prior: &[Message],
    ) -> ModelRequest {
        ModelRequest {
            system_instruction: self.preamble.as_deref().map(str::to_owned),
            history: prior.iter().map(Message::to_model_message).collect(),
            message: user_text.to_owned(),
        }
    }
}
