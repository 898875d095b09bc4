mod create_file;
mod create_widget;
mod generate_test_file;
mod list_files;
mod update_file;
mod update_widget;

pub use create_file::CreateFileTool;
pub use create_widget::CreateWidgetTool;
pub use generate_test_file::GenerateTestFileTool;
pub use list_files::ListFilesTool;
pub use update_file::UpdateFileTool;
pub use update_widget::UpdateWidgetTool;

use mentor_core::{AiWidget, CodeFile, ToolError};
use serde_json::{json, Value};

pub const CREATE_FILE: &str = "createFile";
pub const UPDATE_FILE: &str = "updateFile";
pub const LIST_FILES: &str = "listFiles";
pub const GENERATE_TEST_FILE: &str = "generateTestFile";
pub const CREATE_WIDGET: &str = "createWidget";
pub const UPDATE_WIDGET: &str = "updateWidget";

pub const DEFAULT_TEST_FRAMEWORK: &str = "jest";

pub(crate) fn file_descriptor(file: &CodeFile) -> Value {
    json!({
        "id": file.id,
        "name": file.name,
        "language": file.language,
        "code": file.code,
    })
}

pub(crate) fn widget_descriptor(widget: &AiWidget) -> Value {
    json!({
        "id": widget.id,
        "prompt": widget.prompt,
        "lastUpdatedAt": widget.last_updated_at,
    })
}

/// Reads a string argument; presence and type were validated already.
pub(crate) fn str_arg<'a>(args: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    args.get(name)
        .and_then(|value| value.as_str())
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing required field '{name}'")))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use mentor_core::SessionStore;
    use mentor_llm::testing::ScriptedGateway;
    use tokio_util::sync::CancellationToken;

    use crate::context::ToolContext;

    pub fn context() -> (ToolContext, Arc<ScriptedGateway>) {
        let gateway = Arc::new(ScriptedGateway::new());
        let store = SessionStore::new();
        let ctx = ToolContext::new(
            store.create("sandbox"),
            gateway.clone(),
            CancellationToken::new(),
        );
        (ctx, gateway)
    }
}
