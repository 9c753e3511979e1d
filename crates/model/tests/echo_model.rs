use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use folio_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

#[derive(Debug)]
struct EchoModelProviderError(ErrorKind);

impl Display for EchoModelProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for EchoModelProviderError {}

impl ModelProviderError for EchoModelProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

#[derive(Debug)]
struct EchoModelResponse {
    words: VecDeque<String>,
    completed: bool,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl EchoModelResponse {
    fn new(input: &str, turn: usize) -> Self {
        let words = format!("({turn}) You said {input}")
            .split(' ')
            .map(ToString::to_string)
            .collect();
        Self {
            words,
            completed: false,
            sleep: None,
        }
    }
}

impl ModelResponse for EchoModelResponse {
    type Error = EchoModelProviderError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };
        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;

            if let Some(mut word) = this.words.pop_front() {
                if !this.words.is_empty() {
                    word.push(' ');
                }
                return Poll::Ready(Ok(Some(
                    ModelResponseEvent::MessageDelta(word),
                )));
            }
            if !this.completed {
                this.completed = true;
                return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                    ModelFinishReason::Stop,
                ))));
            }
            return Poll::Ready(Ok(None));
        }
        this.sleep = Some(Box::pin(sleep(Duration::from_millis(1))));
        Pin::new(this).poll_next_event(cx)
    }
}

struct EchoModelProvider;

impl ModelProvider for EchoModelProvider {
    type Error = EchoModelProviderError;
    type Response = EchoModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let result = if req.message.trim().is_empty() {
            Err(EchoModelProviderError(ErrorKind::Other))
        } else {
            let turn = req
                .history
                .iter()
                .filter(|msg| matches!(msg, ModelMessage::User(_)))
                .count();
            Ok(EchoModelResponse::new(&req.message, turn))
        };
        ready(result)
    }
}

mod tests {
    use std::future::poll_fn;

    use super::*;

    async fn collect(mut resp: EchoModelResponse) -> (String, ModelFinishReason) {
        let mut text = String::new();
        loop {
            let event = poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx))
                .await
                .unwrap();
            match event {
                Some(ModelResponseEvent::MessageDelta(delta)) => {
                    text.push_str(&delta);
                }
                Some(ModelResponseEvent::Completed(reason)) => {
                    return (text, reason);
                }
                None => unreachable!("completed event is missing"),
            }
        }
    }

    #[tokio::test]
    async fn test_completion() {
        let provider = EchoModelProvider;
        assert!(provider.has_credential());

        let req = ModelRequest {
            system_instruction: Some("Be brief.".to_owned()),
            history: vec![],
            message: "Good morning".to_owned(),
        };
        let resp = provider.send_request(&req).await.unwrap();
        let (text, reason) = collect(resp).await;
        assert_eq!(text, "(0) You said Good morning");
        assert_eq!(reason, ModelFinishReason::Stop);
    }

    #[tokio::test]
    async fn test_history_is_visible_to_provider() {
        let provider = EchoModelProvider;
        let req = ModelRequest {
            system_instruction: None,
            history: vec![
                ModelMessage::User("Hi".to_owned()),
                ModelMessage::Model("Hello!".to_owned()),
            ],
            message: "How are you?".to_owned(),
        };
        let resp = provider.send_request(&req).await.unwrap();
        let (text, _) = collect(resp).await;
        assert_eq!(text, "(1) You said How are you?");
    }

    #[tokio::test]
    async fn test_error() {
        let provider = EchoModelProvider;
        let req = ModelRequest::default();
        let result = provider.send_request(&req).await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[test]
    fn test_message_serialization() {
        let msg = ModelMessage::Model("Hi there".to_owned());
        assert_eq!(msg.text(), "Hi there");
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"role":"model","text":"Hi there"}"#
        );
        let back: ModelMessage =
            serde_json::from_str(r#"{"role":"user","text":"Hello"}"#).unwrap();
        assert_eq!(back, ModelMessage::User("Hello".to_owned()));
    }
}
