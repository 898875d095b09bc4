use async_trait::async_trait;
use mentor_core::{ToolError, ToolResult};
use serde_json::{json, Value};

use crate::context::ToolContext;
use crate::registry::Tool;
use crate::tools::{file_descriptor, str_arg, CREATE_FILE};

/// Adds a new file to the session workspace. Existing names are rejected.
pub struct CreateFileTool;

#[async_trait]
impl Tool for CreateFileTool {
    fn name(&self) -> &str {
        CREATE_FILE
    }

    fn description(&self) -> &str {
        "Create a new file in the workspace. Fails if a file with that name already exists; use updateFile to change an existing file."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "fileName": {
                    "type": "string",
                    "description": "Name of the file, including its extension (e.g., index.html)"
                },
                "code": {
                    "type": "string",
                    "description": "Full contents of the file"
                }
            },
            "required": ["fileName", "code"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let file_name = str_arg(&args, "fileName")?;
        let code = str_arg(&args, "code")?;

        let descriptor = ctx
            .apply(|session| {
                let file = session.workspace.create_file(file_name, code)?;
                Ok(file_descriptor(file))
            })
            .await?;

        Ok(ToolResult::ok(
            descriptor,
            format!("Created file '{}'", file_name.trim()),
        ))
    }
}
