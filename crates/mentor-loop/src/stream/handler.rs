use std::time::Duration;

use futures::StreamExt;
use mentor_core::{SessionEvent, SessionHandle, Source, ToolCall};
use mentor_llm::{ChatStream, LLMError, TokenUsage};
use tokio_util::sync::CancellationToken;

use crate::events::EventSink;

#[derive(Debug, Default)]
pub struct StreamOutput {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub sources: Vec<Source>,
    pub usage: Option<TokenUsage>,
    /// The token was cancelled before the stream ended.
    pub stopped: bool,
}

/// Drains a reply stream into the assistant message `message_id`.
///
/// Text is appended to the message as it arrives, so whatever was received
/// before a stop or an error stays in the conversation.
pub async fn consume_chat_stream(
    mut stream: ChatStream,
    session: &SessionHandle,
    message_id: &str,
    events: &EventSink,
    cancel: &CancellationToken,
    idle_timeout: Duration,
) -> Result<StreamOutput, LLMError> {
    let mut output = StreamOutput::default();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                output.stopped = true;
                break;
            }
            next = tokio::time::timeout(idle_timeout, stream.next()) => next,
        };

        let chunk = match next {
            Err(_) => {
                return Err(LLMError::Timeout {
                    operation: "chat stream".to_string(),
                    secs: idle_timeout.as_secs(),
                })
            }
            Ok(None) => break,
            Ok(Some(chunk)) => chunk?,
        };

        if !chunk.text.is_empty() {
            {
                let mut session = session.write().await;
                if cancel.is_cancelled() {
                    output.stopped = true;
                    break;
                }
                if let Some(message) = session.message_mut(message_id) {
                    message.text.push_str(&chunk.text);
                }
            }
            output.text.push_str(&chunk.text);
            events
                .send(SessionEvent::Token {
                    content: chunk.text,
                })
                .await;
        }

        if !chunk.tool_calls.is_empty() {
            log::debug!("Received {} tool calls", chunk.tool_calls.len());
            output.tool_calls.extend(chunk.tool_calls);
        }
        for source in chunk.sources {
            if !output.sources.iter().any(|s| s.uri == source.uri) {
                output.sources.push(source);
            }
        }
        if chunk.usage.is_some() {
            output.usage = chunk.usage;
        }
    }

    Ok(output)
}
