use async_trait::async_trait;
use mentor_core::{ToolError, ToolResult};
use serde_json::{json, Value};

use crate::context::{gateway_error, ToolContext};
use crate::registry::Tool;
use crate::tools::{str_arg, widget_descriptor, CREATE_WIDGET};

pub struct CreateWidgetTool;

#[async_trait]
impl Tool for CreateWidgetTool {
    fn name(&self) -> &str {
        CREATE_WIDGET
    }

    fn description(&self) -> &str {
        "Create a new UI widget from a natural-language description."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "Description of the widget to build"
                }
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let prompt = str_arg(&args, "prompt")?;

        let markup = ctx
            .gateway
            .generate_widget(prompt, &ctx.cancel)
            .await
            .map_err(gateway_error)?;

        let descriptor = ctx
            .apply(|session| Ok(widget_descriptor(session.widgets.create(prompt, &markup))))
            .await?;

        Ok(ToolResult::ok(descriptor, format!("Created widget: {prompt}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::context;
    use mentor_llm::testing::widget_markup;

    #[tokio::test]
    async fn creates_active_widget() {
        let (ctx, _) = context();

        let result = CreateWidgetTool
            .execute(json!({"prompt": "a digital clock"}), &ctx)
            .await
            .unwrap();

        let id = result.result["id"].as_str().unwrap().to_string();
        assert_eq!(result.result["prompt"], "a digital clock");
        assert!(result.result.get("lastUpdatedAt").is_some());
        let (active, markup) = ctx
            .read(|s| {
                (
                    s.widgets.active_widget_id.clone(),
                    s.widgets.get(&id).map(|w| w.markup.clone()),
                )
            })
            .await;
        assert_eq!(active.as_deref(), Some(id.as_str()));
        assert_eq!(markup, Some(widget_markup("a digital clock")));
    }

    #[tokio::test]
    async fn cancelled_context_creates_nothing() {
        let (ctx, _) = context();
        ctx.cancel.cancel();

        let error = CreateWidgetTool
            .execute(json!({"prompt": "a clock"}), &ctx)
            .await
            .unwrap_err();

        assert_eq!(error, ToolError::Cancelled);
        assert!(ctx.read(|s| s.widgets.is_empty()).await);
    }
}
