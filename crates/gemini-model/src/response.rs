use std::pin::Pin;
use std::task::{Context, Poll, ready};

use folio_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
};
use pin_project_lite::pin_project;
use reqwest::StatusCode;

use crate::io::Sse;
use crate::proto::{ErrorBody, GenerateContentChunk};
use crate::{Error, status_kind};

struct PartialState {
    sse: Sse,
    // Emitted after the text of the chunk that carried it.
    pending_finish_reason: Option<ModelFinishReason>,
    finished: bool,
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    pub struct GeminiResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl GeminiResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            pending_finish_reason: None,
            finished: false,
        };
        let next_event_fut = async move { next_event(partial_state).await };
        Self {
            next_event_fut: Some(Box::pin(next_event_fut)),
        }
    }
}

impl ModelResponse for GeminiResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, _)) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // The stream may still have more data to pull, create a new future for
        // the next event.
        let next_event_fut = async move { next_event(partial_state).await };
        *this.next_event_fut = Some(Box::pin(next_event_fut));

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(
    mut partial_state: PartialState,
) -> Result<(Option<ModelResponseEvent>, PartialState), Error> {
    loop {
        if let Some(reason) = partial_state.pending_finish_reason.take() {
            return Ok((
                Some(ModelResponseEvent::Completed(reason)),
                partial_state,
            ));
        }

        let sse_event = match partial_state.sse.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) if partial_state.finished => {
                return Ok((None, partial_state));
            }
            Ok(None) => {
                return Err(Error::new(
                    "stream ended before the model finished",
                    ErrorKind::Other,
                ));
            }
            Err(err) => {
                return Err(Error::new(format!("{err:?}"), ErrorKind::Other));
            }
        };
        trace!("got sse event: {sse_event}");

        let chunk = serde_json::from_str::<GenerateContentChunk>(&sse_event)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;

        if let Some(error) = chunk.error {
            return Err(stream_error(error));
        }

        if let Some(block_reason) = chunk
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
        {
            return Err(Error::new(
                format!("prompt blocked: {block_reason}"),
                ErrorKind::Moderated,
            ));
        }

        let Some(candidate) = chunk.candidates.into_iter().next() else {
            continue;
        };
        if let Some(finish_reason) = candidate.finish_reason {
            partial_state.pending_finish_reason =
                Some(parse_finish_reason(&finish_reason));
            partial_state.finished = true;
        }

        let text: String = candidate
            .content
            .into_iter()
            .flat_map(|content| content.parts)
            .filter_map(|part| part.text)
            .collect();
        if !text.is_empty() {
            return Ok((
                Some(ModelResponseEvent::MessageDelta(text)),
                partial_state,
            ));
        }
    }
}

fn stream_error(error: ErrorBody) -> Error {
    let kind = error
        .code
        .and_then(|code| StatusCode::from_u16(code).ok())
        .map(status_kind)
        .unwrap_or(ErrorKind::Other);
    let message = match error.code {
        Some(code) => format!("stream error {code}: {}", error.message),
        None => format!("stream error: {}", error.message),
    };
    Error::new(message, kind)
}

fn parse_finish_reason(reason: &str) -> ModelFinishReason {
    match reason {
        "STOP" => ModelFinishReason::Stop,
        "MAX_TOKENS" => ModelFinishReason::MaxTokens,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT"
        | "SPII" => ModelFinishReason::Safety,
        _ => ModelFinishReason::Other,
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;
    use folio_model::ModelProviderError;

    use super::*;
    use crate::io::Chunks;

    async fn collect(
        chunks: Vec<Bytes>,
    ) -> Result<(String, Vec<ModelFinishReason>), Error> {
        let sse = Sse::new(Chunks::from_vec_deque(chunks.into()));
        let mut resp = pin!(GeminiResponse::from_sse(sse));
        let mut text = String::new();
        let mut reasons = vec![];
        while let Some(event) =
            poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await?
        {
            match event {
                ModelResponseEvent::MessageDelta(delta) => text.push_str(&delta),
                ModelResponseEvent::Completed(reason) => reasons.push(reason),
            }
        }
        Ok((text, reasons))
    }

    #[tokio::test]
    async fn test_fixture_stream() {
        let (text, reasons) = collect(vec![Bytes::from_static(include_bytes!(
            "../fixtures/stream_response.txt"
        ))])
        .await
        .unwrap();
        assert_eq!(
            text,
            "Dauda builds RAG systems and AI agents, backed by an Nvidia \
             certification."
        );
        assert_eq!(reasons, vec![ModelFinishReason::Stop]);
    }

    #[tokio::test]
    async fn test_blocked_prompt() {
        let err = collect(vec![Bytes::from_static(
            b"data: {\"promptFeedback\": {\"blockReason\": \"SAFETY\"}}\r\n\r\n",
        )])
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Moderated);
    }

    #[tokio::test]
    async fn test_malformed_chunk() {
        let err = collect(vec![Bytes::from_static(b"data: {not json}\n\n")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[tokio::test]
    async fn test_error_after_text() {
        let err = collect(vec![
            Bytes::from_static(
                b"data: {\"candidates\": [{\"content\": {\"parts\": [{\"text\": \"Half \"}]}}]}\r\n\r\n",
            ),
            Bytes::from_static(
                b"data: {\"error\": {\"code\": 500, \"message\": \"Internal error\", \"status\": \"INTERNAL\"}}\r\n\r\n",
            ),
        ])
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert_eq!(err.message(), "stream error 500: Internal error");
    }

    #[tokio::test]
    async fn test_error_only() {
        let err = collect(vec![Bytes::from_static(
            b"data: {\"error\": {\"code\": 503, \"message\": \"The model is overloaded.\"}}\n\n",
        )])
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);

        let err = collect(vec![Bytes::from_static(
            b"data: {\"error\": {\"code\": 429, \"message\": \"Quota exceeded.\"}}\n\n",
        )])
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    }

    #[tokio::test]
    async fn test_unfinished_stream() {
        let err = collect(vec![Bytes::from_static(
            b"data: {\"candidates\": [{\"content\": {\"parts\": [{\"text\": \"Dauda builds\"}]}}]}\n\n",
        )])
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);

        assert!(collect(vec![]).await.is_err());
    }

    #[test]
    fn test_finish_reasons() {
        assert_eq!(parse_finish_reason("STOP"), ModelFinishReason::Stop);
        assert_eq!(
            parse_finish_reason("MAX_TOKENS"),
            ModelFinishReason::MaxTokens
        );
        assert_eq!(parse_finish_reason("SAFETY"), ModelFinishReason::Safety);
        assert_eq!(parse_finish_reason("LANGUAGE"), ModelFinishReason::Other);
    }
}
