use async_trait::async_trait;
use mentor_core::{ToolError, ToolResult, WidgetError};
use serde_json::{json, Value};

use crate::context::{gateway_error, ToolContext};
use crate::registry::Tool;
use crate::tools::{str_arg, widget_descriptor, UPDATE_WIDGET};

/// Regenerates an existing widget in place from a new prompt.
pub struct UpdateWidgetTool;

#[async_trait]
impl Tool for UpdateWidgetTool {
    fn name(&self) -> &str {
        UPDATE_WIDGET
    }

    fn description(&self) -> &str {
        "Regenerate an existing widget from an updated description."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "widgetId": {
                    "type": "string",
                    "description": "Id of the widget to update"
                },
                "newPrompt": {
                    "type": "string",
                    "description": "Full updated description of the widget"
                }
            },
            "required": ["widgetId", "newPrompt"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let widget_id = str_arg(&args, "widgetId")?;
        let new_prompt = str_arg(&args, "newPrompt")?;

        // Unknown ids fail before any remote call.
        if !ctx.read(|session| session.widgets.contains(widget_id)).await {
            return Err(WidgetError::NotFound(widget_id.to_string()).into());
        }

        let markup = ctx
            .gateway
            .generate_widget(new_prompt, &ctx.cancel)
            .await
            .map_err(gateway_error)?;

        let descriptor = ctx
            .apply(|session| {
                let widget = session.widgets.update(widget_id, new_prompt, &markup)?;
                Ok(widget_descriptor(widget))
            })
            .await?;

        Ok(ToolResult::ok(descriptor, format!("Updated widget: {new_prompt}")))
    }
}
