use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub tool_type: String,
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

impl ToolCall {
    /// Builds a call from a tool name and a JSON argument object.
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            id: format!("call_{}", Uuid::new_v4().simple()),
            tool_type: function_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: args.to_string(),
            },
        }
    }

    /// Builds a call whose argument text is kept as received.
    pub fn with_raw_arguments(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: format!("call_{}", Uuid::new_v4().simple()),
            tool_type: function_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub function: FunctionSchema,
}

/// Outcome of one applied tool call.
///
/// `result` carries the structured descriptor (file or widget), `summary`
/// is the one-line text shown in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub success: bool,
    pub result: Value,
    pub summary: String,
}

impl ToolResult {
    pub fn ok(result: Value, summary: impl Into<String>) -> Self {
        Self {
            success: true,
            result,
            summary: summary.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_call_serializes_type_field() {
        let call = ToolCall::new("createFile", json!({"fileName": "a.js"})).with_id("call_1");
        let value = serde_json::to_value(&call).unwrap();

        assert_eq!(value["id"], "call_1");
        assert_eq!(value["type"], "function");
        assert_eq!(value["function"]["name"], "createFile");
        assert_eq!(value["function"]["arguments"], r#"{"fileName":"a.js"}"#);
    }

    #[test]
    fn tool_call_type_defaults_when_missing() {
        let call: ToolCall = serde_json::from_value(json!({
            "id": "x",
            "function": {"name": "listFiles", "arguments": "{}"}
        }))
        .unwrap();

        assert_eq!(call.tool_type, "function");
        assert_eq!(call.name(), "listFiles");
    }
}
