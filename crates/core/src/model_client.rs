use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use folio_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tracing::Instrument;

type SendRequestResult =
    Result<ModelClientResponse, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// A wrapper around a model provider that drains the streamed response
/// and provides a type-erased interface for the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
    has_credential: bool,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        let has_credential = provider.has_credential();
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    let resp_or_err = fut.await;
                    handle_response::<P>(resp_or_err).await
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self {
            handler_fn,
            has_credential,
        }
    }

    /// Returns whether the wrapped provider has a credential.
    #[inline]
    pub fn has_credential(&self) -> bool {
        self.has_credential
    }

    /// Sends a request and returns the completely received response.
    #[inline]
    pub async fn send_request(&self, req: ModelRequest) -> SendRequestResult {
        (self.handler_fn)(req).await
    }
}

/// A completely received response from the model client.
#[derive(Clone, Debug)]
pub struct ModelClientResponse {
    pub text: String,
    /// The reason the model finished generating.
    pub finish_reason: ModelFinishReason,
}

/// The stream ended without the model reporting that it had finished.
#[derive(Debug)]
struct UnfinishedResponseError;

impl Display for UnfinishedResponseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("the response ended before the model finished")
    }
}

impl Error for UnfinishedResponseError {}

impl ModelProviderError for UnfinishedResponseError {
    #[inline]
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err:?}");
            return Err(Box::new(err));
        }
    };

    let mut text = String::new();
    let mut finish_reason = None;

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(event) => event,
            Err(err) => {
                // Whatever arrived so far is dropped with the error.
                error!("got an error: {err:?}");
                return Err(Box::new(err));
            }
        };

        let Some(event) = event else {
            break;
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(delta) => {
                text.push_str(&delta);
            }
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }

    trace!("finished a request");

    let Some(finish_reason) = finish_reason else {
        error!("response ended without a finish reason");
        return Err(Box::new(UnfinishedResponseError));
    };

    Ok(ModelClientResponse {
        text,
        finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use folio_model::ErrorKind;
    use folio_test_model::{PresetEvent, PresetResponse, TestModelProvider};

    use super::*;

    fn request(message: &str) -> ModelRequest {
        ModelRequest {
            system_instruction: None,
            history: vec![],
            message: message.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_turn(PresetResponse::with_events([
            PresetEvent::MessageDelta("How ".to_owned()),
            PresetEvent::MessageDelta("are ".to_owned()),
            PresetEvent::MessageDelta("you?".to_owned()),
        ]));
        let observer = model_provider.clone();

        let model_client = ModelClient::new(model_provider);
        assert!(model_client.has_credential());

        for _ in 0..3 {
            let resp = model_client.send_request(request("Hi")).await.unwrap();
            assert_eq!(resp.text, "How are you?");
            assert_eq!(resp.finish_reason, ModelFinishReason::Stop);
        }
        assert_eq!(observer.call_count(), 3);
    }

    #[tokio::test]
    async fn test_error_handling() {
        let model_provider = TestModelProvider::default();
        let model_client = ModelClient::new(model_provider);
        let err = model_client.send_request(request("Hi")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[tokio::test]
    async fn test_stream_error_drops_partial_text() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_turn(PresetResponse::with_events([
            PresetEvent::MessageDelta("Half a ".to_owned()),
            PresetEvent::Error,
        ]));
        let model_client = ModelClient::new(model_provider);
        assert!(model_client.send_request(request("Hi")).await.is_err());
    }

    #[tokio::test]
    async fn test_unfinished_stream_is_an_error() {
        let mut model_provider = TestModelProvider::default();
        model_provider
            .add_turn(PresetResponse::with_text("Cut off mid").unfinished());
        let model_client = ModelClient::new(model_provider);
        let err = model_client.send_request(request("Hi")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert_eq!(
            err.to_string(),
            "the response ended before the model finished"
        );
    }

    #[test]
    fn test_credential_is_captured() {
        let model_client =
            ModelClient::new(TestModelProvider::default().without_credential());
        assert!(!model_client.has_credential());
    }
}
