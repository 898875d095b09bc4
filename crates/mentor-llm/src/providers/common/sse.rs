//! Turns a `text/event-stream` body into a [`ChatStream`].

use eventsource_stream::{Event, Eventsource};
use futures_util::{future, StreamExt};
use reqwest::Response;

use crate::error::{LLMError, Result};
use crate::types::{ChatChunk, ChatStream};

/// Build a chat stream from an SSE response.
///
/// Each event's name and data go to `decode`. `Ok(None)` drops the event.
/// An `LLMError::Api` from `decode` surfaces unchanged so its text can be
/// shown to the user; any other failure is reported as `LLMError::Stream`.
pub fn chat_stream_from_sse<H>(response: Response, mut decode: H) -> ChatStream
where
    H: FnMut(&str, &str) -> Result<Option<ChatChunk>> + Send + 'static,
{
    let frames = response.bytes_stream().eventsource();
    let chunks = frames.filter_map(move |frame| {
        let item = match frame {
            Err(transport) => Some(Err(LLMError::Stream(transport.to_string()))),
            Ok(Event { event, data, .. }) => match decode(&event, &data) {
                Ok(chunk) => chunk.map(Ok),
                Err(api @ LLMError::Api(_)) | Err(api @ LLMError::Stream(_)) => Some(Err(api)),
                Err(decode_failure) => Some(Err(LLMError::Stream(decode_failure.to_string()))),
            },
        };
        future::ready(item)
    });
    Box::pin(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn collect<H>(body: &'static str, decode: H) -> Vec<Result<ChatChunk>>
    where
        H: FnMut(&str, &str) -> Result<Option<ChatChunk>> + Send + 'static,
    {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;
        let response = reqwest::Client::new()
            .post(server.uri())
            .send()
            .await
            .unwrap();
        chat_stream_from_sse(response, decode).collect().await
    }

    #[tokio::test]
    async fn decoded_chunks_arrive_in_order_and_skips_vanish() {
        let items = collect("data: Hel\n\ndata: [DONE]\n\ndata: lo\n\n", |_, data| {
            Ok((data != "[DONE]").then(|| ChatChunk::text(data)))
        })
        .await;

        let texts: Vec<ChatChunk> = items.into_iter().map(|item| item.unwrap()).collect();
        assert_eq!(texts, vec![ChatChunk::text("Hel"), ChatChunk::text("lo")]);
    }

    #[tokio::test]
    async fn event_names_reach_the_decoder() {
        let items = collect("event: ping\ndata: x\n\ndata: y\n\n", |event, data| {
            if event == "ping" {
                return Ok(None);
            }
            Ok(Some(ChatChunk::text(data)))
        })
        .await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap(), &ChatChunk::text("y"));
    }

    #[tokio::test]
    async fn api_errors_survive_and_decode_failures_become_stream_errors() {
        let items = collect("data: quota\n\ndata: {broken\n\n", |_, data| match data {
            "quota" => Err(LLMError::Api("Quota exceeded".to_string())),
            other => Err(LLMError::InvalidResponse(other.to_string())),
        })
        .await;

        assert!(matches!(&items[0], Err(LLMError::Api(m)) if m == "Quota exceeded"));
        assert!(matches!(&items[1], Err(LLMError::Stream(m)) if m.contains("{broken")));
    }
}
