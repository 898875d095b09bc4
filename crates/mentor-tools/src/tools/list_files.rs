use async_trait::async_trait;
use mentor_core::{ToolError, ToolResult};
use serde_json::{json, Value};

use crate::context::ToolContext;
use crate::registry::Tool;
use crate::tools::LIST_FILES;

pub struct ListFilesTool;

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        LIST_FILES
    }

    fn description(&self) -> &str {
        "List the files currently in the workspace with their language and size."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _args: Value, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let files: Vec<Value> = ctx
            .read(|session| {
                session
                    .workspace
                    .files
                    .iter()
                    .map(|file| {
                        json!({
                            "id": file.id,
                            "name": file.name,
                            "language": file.language,
                            "size": file.code.len(),
                        })
                    })
                    .collect()
            })
            .await;

        let summary = format!("Listed {} files", files.len());
        Ok(ToolResult::ok(Value::Array(files), summary))
    }
}
