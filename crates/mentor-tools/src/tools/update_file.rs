use async_trait::async_trait;
use mentor_core::{ToolError, ToolResult};
use serde_json::{json, Value};

use crate::context::ToolContext;
use crate::registry::Tool;
use crate::tools::{file_descriptor, str_arg, UPDATE_FILE};

pub struct UpdateFileTool;

#[async_trait]
impl Tool for UpdateFileTool {
    fn name(&self) -> &str {
        UPDATE_FILE
    }

    fn description(&self) -> &str {
        "Replace the contents of an existing workspace file."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "fileName": {
                    "type": "string",
                    "description": "Name of the existing file"
                },
                "code": {
                    "type": "string",
                    "description": "New full contents of the file"
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
                let file = session.workspace.update_file_by_name(file_name, code)?;
                Ok(file_descriptor(file))
            })
            .await?;

        Ok(ToolResult::ok(descriptor, format!("Updated file '{file_name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::context;

    #[tokio::test]
    async fn preserves_id_and_count() {
        let (ctx, _) = context();
        let id = ctx
            .apply(|s| Ok(s.workspace.create_file("app.py", "print(1)")?.id.clone()))
            .await
            .unwrap();

        let result = UpdateFileTool
            .execute(json!({"fileName": "app.py", "code": "print(2)"}), &ctx)
            .await
            .unwrap();

        assert_eq!(result.result["id"], id.as_str());
        let (count, code) = ctx
            .read(|s| (s.workspace.len(), s.workspace.file(&id).map(|f| f.code.clone())))
            .await;
        assert_eq!(count, 1);
        assert_eq!(code.as_deref(), Some("print(2)"));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let (ctx, _) = context();
        let error = UpdateFileTool
            .execute(json!({"fileName": "ghost.js", "code": ""}), &ctx)
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "File 'ghost.js' not found");
    }
}
