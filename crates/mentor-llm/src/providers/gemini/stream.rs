//! Gemini SSE stream parser.
//!
//! With `alt=sse` every event carries one `GenerateContentResponse`:
//! ```text
//! data: {"candidates":[{"content":{"parts":[{"text":"Hello"}],"role":"model"}}]}
//!
//! data: {"candidates":[{"content":{"parts":[{"functionCall":{"name":"createFile","args":{"fileName":"a.js"}}}]}}]}
//! ```

use mentor_core::{Source, ToolCall};
use serde_json::Value;

use crate::error::{LLMError, Result};
use crate::types::{ChatChunk, TokenUsage};

/// Generates stable tool call ids across the events of one stream.
#[derive(Default)]
pub struct GeminiStreamState {
    next_tool_id: usize,
}

impl GeminiStreamState {
    fn generate_tool_id(&mut self) -> String {
        let id = format!("gemini_{}", self.next_tool_id);
        self.next_tool_id += 1;
        id
    }
}

/// Parse one Gemini SSE event into an optional [`ChatChunk`].
///
/// Returns `Ok(None)` for events without content, `Err` for malformed JSON or
/// an in-band API error.
pub fn parse_gemini_sse_event(
    state: &mut GeminiStreamState,
    _event_type: &str,
    data: &str,
) -> Result<Option<ChatChunk>> {
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(data)
        .map_err(|e| LLMError::Stream(format!("Failed to parse Gemini SSE data: {}", e)))?;

    parse_gemini_response(state, &value).map(|chunk| (!chunk.is_empty()).then_some(chunk))
}

/// Extracts text, function calls, grounding sources and usage from one response object.
pub fn parse_gemini_response(state: &mut GeminiStreamState, value: &Value) -> Result<ChatChunk> {
    if let Some(error) = value.get("error") {
        let error_msg = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown Gemini API error");
        return Err(LLMError::Api(error_msg.to_string()));
    }

    let mut chunk = ChatChunk {
        usage: parse_usage(value),
        ..Default::default()
    };

    let Some(candidate) = value
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|candidates| candidates.first())
    else {
        if let Some(reason) = value
            .pointer("/promptFeedback/blockReason")
            .and_then(|r| r.as_str())
        {
            return Err(LLMError::Api(format!(
                "The request was blocked by the model ({reason})."
            )));
        }
        return Ok(chunk);
    };

    if let Some(parts) = candidate
        .pointer("/content/parts")
        .and_then(|p| p.as_array())
    {
        for part in parts {
            if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                chunk.text.push_str(text);
            }
            if let Some(call) = part.get("functionCall") {
                let name = call
                    .get("name")
                    .and_then(|n| n.as_str())
                    .ok_or_else(|| LLMError::Stream("functionCall without a name".to_string()))?;
                let args = call
                    .get("args")
                    .cloned()
                    .unwrap_or_else(|| Value::Object(Default::default()));
                chunk
                    .tool_calls
                    .push(ToolCall::new(name, args).with_id(state.generate_tool_id()));
            }
        }
    }

    if let Some(grounding) = candidate
        .pointer("/groundingMetadata/groundingChunks")
        .and_then(|g| g.as_array())
    {
        chunk.sources = grounding
            .iter()
            .filter_map(|entry| entry.get("web"))
            .filter_map(|web| {
                let uri = web.get("uri")?.as_str()?.to_string();
                let title = web
                    .get("title")
                    .and_then(|t| t.as_str())
                    .unwrap_or(&uri)
                    .to_string();
                Some(Source { uri, title })
            })
            .collect();
    }

    Ok(chunk)
}

fn parse_usage(value: &Value) -> Option<TokenUsage> {
    let usage = value.get("usageMetadata")?;
    let read = |key: &str| {
        usage
            .get(key)
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32
    };
    Some(TokenUsage {
        prompt_tokens: read("promptTokenCount"),
        completion_tokens: read("candidatesTokenCount"),
        total_tokens: read("totalTokenCount"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_chunk() {
        let mut state = GeminiStreamState::default();
        let data = r#"{"candidates":[{"content":{"parts":[{"text":"Hello"}],"role":"model"}}]}"#;

        let chunk = parse_gemini_sse_event(&mut state, "", data).unwrap().unwrap();

        assert_eq!(chunk.text, "Hello");
        assert!(chunk.tool_calls.is_empty());
    }

    #[test]
    fn parses_function_calls_with_sequential_ids() {
        let mut state = GeminiStreamState::default();
        let data = r#"{"candidates":[{"content":{"parts":[
            {"functionCall":{"name":"createWidget","args":{"prompt":"a clock"}}},
            {"functionCall":{"name":"listFiles"}}
        ]}}]}"#;

        let chunk = parse_gemini_sse_event(&mut state, "", data).unwrap().unwrap();

        assert_eq!(chunk.tool_calls.len(), 2);
        assert_eq!(chunk.tool_calls[0].id, "gemini_0");
        assert_eq!(chunk.tool_calls[0].function.name, "createWidget");
        assert_eq!(chunk.tool_calls[0].function.arguments, r#"{"prompt":"a clock"}"#);
        assert_eq!(chunk.tool_calls[1].id, "gemini_1");
        assert_eq!(chunk.tool_calls[1].function.arguments, "{}");
    }

    #[test]
    fn parses_grounding_sources_and_usage() {
        let mut state = GeminiStreamState::default();
        let data = r#"{
            "candidates":[{
                "content":{"parts":[{"text":"Rust 1.80 shipped."}]},
                "groundingMetadata":{"groundingChunks":[
                    {"web":{"uri":"https://blog.rust-lang.org","title":"Rust Blog"}},
                    {"web":{"uri":"https://example.com"}}
                ]}
            }],
            "usageMetadata":{"promptTokenCount":10,"candidatesTokenCount":5,"totalTokenCount":15}
        }"#;

        let chunk = parse_gemini_sse_event(&mut state, "", data).unwrap().unwrap();

        assert_eq!(chunk.sources.len(), 2);
        assert_eq!(chunk.sources[0].title, "Rust Blog");
        assert_eq!(chunk.sources[1].title, "https://example.com");
        assert_eq!(
            chunk.usage,
            Some(TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15
            })
        );
    }

    #[test]
    fn skips_empty_events_and_surfaces_api_errors() {
        let mut state = GeminiStreamState::default();
        assert!(parse_gemini_sse_event(&mut state, "", "  ").unwrap().is_none());
        assert!(parse_gemini_sse_event(&mut state, "", r#"{"candidates":[]}"#)
            .unwrap()
            .is_none());

        let error = parse_gemini_sse_event(
            &mut state,
            "",
            r#"{"error":{"code":429,"message":"Resource exhausted"}}"#,
        )
        .unwrap_err();
        assert!(matches!(error, LLMError::Api(msg) if msg == "Resource exhausted"));
    }

    #[test]
    fn blocked_prompt_is_an_api_error() {
        let mut state = GeminiStreamState::default();
        let error = parse_gemini_sse_event(
            &mut state,
            "",
            r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#,
        )
        .unwrap_err();
        assert!(matches!(error, LLMError::Api(msg) if msg.contains("SAFETY")));
    }

    #[test]
    fn malformed_json_is_a_stream_error() {
        let mut state = GeminiStreamState::default();
        let error = parse_gemini_sse_event(&mut state, "", "{oops").unwrap_err();
        assert!(matches!(error, LLMError::Stream(_)));
    }
}
