//! Conversation history -> Gemini `generateContent` body.

use mentor_core::{Message, Role};
use serde_json::{json, Map, Value};

use crate::prompts;
use crate::types::ChatRequest;

fn function_responses(message: &Message) -> Vec<Value> {
    message
        .tool_responses
        .iter()
        .flatten()
        .map(|response| {
            json!({
                "functionResponse": { "name": response.name, "response": response.response }
            })
        })
        .collect()
}

fn message_parts(message: &Message) -> Vec<Value> {
    let mut parts = Vec::new();

    if let Some(attachment) = &message.attachment {
        parts.push(json!({
            "inlineData": { "mimeType": attachment.mime_type, "data": attachment.data }
        }));
    }

    if message.role == Role::Tool {
        parts.extend(function_responses(message));
        if parts.is_empty() && !message.text.is_empty() {
            parts.push(json!({ "text": message.text }));
        }
        return parts;
    }

    if !message.text.is_empty() {
        parts.push(json!({ "text": message.text }));
    }
    for call in message.tool_calls.iter().flatten() {
        let args: Value = serde_json::from_str(&call.function.arguments)
            .unwrap_or_else(|_| Value::Object(Map::new()));
        parts.push(json!({
            "functionCall": { "name": call.function.name, "args": args }
        }));
    }
    parts
}

/// Maps the history to Gemini `contents`.
///
/// Assistant turns become `model`. Tool results go back as `user` turns of
/// `functionResponse` parts, either from a tool message or right after the
/// assistant turn that recorded them. Error notices shown to the user and
/// empty messages are left out.
pub fn build_contents(history: &[Message]) -> Value {
    let mut contents = Vec::new();
    for message in history.iter().filter(|message| !message.is_error) {
        let parts = message_parts(message);
        if parts.is_empty() {
            continue;
        }
        match message.role {
            Role::Assistant => {
                contents.push(json!({ "role": "model", "parts": parts }));
                let responses = function_responses(message);
                if !responses.is_empty() {
                    contents.push(json!({ "role": "user", "parts": responses }));
                }
            }
            Role::User | Role::Tool => contents.push(json!({ "role": "user", "parts": parts })),
        }
    }
    Value::Array(contents)
}

pub fn build_chat_body(request: &ChatRequest) -> Value {
    let instruction = prompts::system_instruction(
        &request.persona,
        request.is_web_access_enabled,
        request.is_cost_saver_mode,
        request.is_deep_analysis,
        &request.custom_instruction,
    );

    let mut generation_config = json!({
        "temperature": prompts::effective_temperature(&request.model_params, request.is_deep_analysis),
        "topP": prompts::effective_top_p(&request.model_params),
    });
    if let Some(top_k) = request.model_params.top_k {
        generation_config["topK"] = json!(top_k);
    }

    let mut body = json!({
        "contents": build_contents(&request.history),
        "systemInstruction": { "parts": [{ "text": instruction }] },
        "generationConfig": generation_config,
    });

    let mut tools = Vec::new();
    if request.is_web_access_enabled {
        tools.push(json!({ "googleSearch": {} }));
    }
    if !request.tools.is_empty() {
        let declarations: Vec<Value> = request
            .tools
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.function.name,
                    "description": tool.function.description,
                    "parameters": tool.function.parameters,
                })
            })
            .collect();
        tools.push(json!({ "functionDeclarations": declarations }));
    }
    if !tools.is_empty() {
        body["tools"] = Value::Array(tools);
    }

    body
}
