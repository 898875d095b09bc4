use async_trait::async_trait;
use mentor_core::workspace::test_file_name;
use mentor_core::{ToolError, ToolResult};
use mentor_llm::{CodeAction, CodeSuggestionRequest};
use serde_json::{json, Value};

use crate::context::{gateway_error, ToolContext};
use crate::registry::Tool;
use crate::tools::{file_descriptor, str_arg, DEFAULT_TEST_FRAMEWORK, GENERATE_TEST_FILE};

/// Asks the model for unit tests of a workspace file and stores them next to it
/// as `<base>.test.<ext>`.
pub struct GenerateTestFileTool;

#[async_trait]
impl Tool for GenerateTestFileTool {
    fn name(&self) -> &str {
        GENERATE_TEST_FILE
    }

    fn description(&self) -> &str {
        "Generate a unit test file for an existing workspace file."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "fileName": {
                    "type": "string",
                    "description": "Name of the source file to test"
                },
                "framework": {
                    "type": "string",
                    "description": "Test framework to use (defaults to jest)"
                }
            },
            "required": ["fileName"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let file_name = str_arg(&args, "fileName")?.trim();
        let framework = args
            .get("framework")
            .and_then(|f| f.as_str())
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_TEST_FRAMEWORK);
        let target = test_file_name(file_name);

        let (code, language) = ctx
            .read(|session| {
                if session.workspace.file_by_name(&target).is_some() {
                    return Err(ToolError::AlreadyExists(format!("File '{target}'")));
                }
                session
                    .workspace
                    .file_by_name(file_name)
                    .map(|file| (file.code.clone(), file.language.clone()))
                    .ok_or_else(|| ToolError::TargetNotFound(format!("File '{file_name}'")))
            })
            .await?;

        let request = CodeSuggestionRequest {
            code,
            language,
            action: CodeAction::Test,
            framework: Some(framework.to_string()),
        };
        let test_code = ctx
            .gateway
            .code_suggestion(&request, &ctx.cancel)
            .await
            .map_err(gateway_error)?;

        let descriptor = ctx
            .apply(|session| {
                let file = session.workspace.create_file(&target, &test_code)?;
                Ok(file_descriptor(file))
            })
            .await?;

        Ok(ToolResult::ok(
            descriptor,
            format!("Generated {framework} tests for '{file_name}' in '{target}'"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::context;

    #[tokio::test]
    async fn creates_test_file_from_gateway_code() {
        let (ctx, gateway) = context();
        gateway.set_code("test('adds', () => expect(add(1, 2)).toBe(3));");
        ctx.apply(|s| {
            s.workspace.create_file("math.js", "export const add = (a, b) => a + b;")?;
            Ok(())
        })
        .await
        .unwrap();

        let result = GenerateTestFileTool
            .execute(json!({"fileName": "math.js"}), &ctx)
            .await
            .unwrap();

        assert_eq!(result.result["name"], "math.test.js");
        assert_eq!(result.result["language"], "javascript");
        assert!(result.summary.contains("jest"));
        let code = ctx
            .read(|s| s.workspace.file_by_name("math.test.js").map(|f| f.code.clone()))
            .await;
        assert_eq!(
            code.as_deref(),
            Some("test('adds', () => expect(add(1, 2)).toBe(3));")
        );
    }

    #[tokio::test]
    async fn padded_file_name_targets_the_trimmed_test_file() {
        let (ctx, _gateway) = context();
        ctx.apply(|s| {
            s.workspace.create_file("a.js", "1")?;
            Ok(())
        })
        .await
        .unwrap();

        let result = GenerateTestFileTool
            .execute(json!({"fileName": "  a.js "}), &ctx)
            .await
            .unwrap();

        assert_eq!(result.result["name"], "a.test.js");
    }

    #[tokio::test]
    async fn missing_source_skips_the_gateway() {
        let (ctx, gateway) = context();

        let error = GenerateTestFileTool
            .execute(json!({"fileName": "nope.py", "framework": "pytest"}), &ctx)
            .await
            .unwrap_err();

        assert_eq!(error, ToolError::TargetNotFound("File 'nope.py'".to_string()));
        assert_eq!(gateway.call_count("code-suggestion"), 0);
    }

    #[tokio::test]
    async fn gateway_failure_leaves_workspace_untouched() {
        let (ctx, gateway) = context();
        gateway.fail("code-suggestion", "quota exceeded");
        ctx.apply(|s| {
            s.workspace.create_file("a.py", "x = 1")?;
            Ok(())
        })
        .await
        .unwrap();

        let error = GenerateTestFileTool
            .execute(json!({"fileName": "a.py"}), &ctx)
            .await
            .unwrap_err();

        assert_eq!(error, ToolError::Execution("quota exceeded".to_string()));
        assert_eq!(ctx.read(|s| s.workspace.len()).await, 1);
    }
}
