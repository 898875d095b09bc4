//! Built-in personas and the tool catalog each one exposes.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PERSONA_ID: &str = "default";
pub const GAMEDEV_PERSONA_ID: &str = "gamedev";
pub const SANDBOX_PERSONA_ID: &str = "sandbox";
pub const WIDGET_FACTORY_PERSONA_ID: &str = "widget_factory";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCatalog {
    None,
    Workspace,
    Widgets,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub description: String,
    pub system_prompt_segment: String,
    #[serde(default)]
    pub is_pro: bool,
    #[serde(default)]
    pub slogan: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub is_custom: bool,
}

impl Persona {
    pub fn tool_catalog(&self) -> ToolCatalog {
        match self.id.as_str() {
            GAMEDEV_PERSONA_ID | SANDBOX_PERSONA_ID => ToolCatalog::Workspace,
            WIDGET_FACTORY_PERSONA_ID => ToolCatalog::Widgets,
            _ => ToolCatalog::None,
        }
    }

    pub fn is_widget_factory(&self) -> bool {
        self.id == WIDGET_FACTORY_PERSONA_ID
    }
}

const WORKSPACE_WORKFLOW: &str = "- **Critical Workflow**:
  1. The user will request a change (e.g., create a file, add a function, generate tests) or provide a high-level goal using \"/execute\".
  2. If the user gives a high-level goal, you MUST first create a plan and then execute it step-by-step using the available tools.
  3. You MUST use the provided tools (`createFile`, `updateFile`, `listFiles`, `generateTestFile`) to fulfill the request. Do not show code in the chat.
  4. The system will execute your tool call and return a result.
  5. After receiving the tool result, you MUST respond with a brief, non-technical summary for the user.
  6. Your turn ends after you provide the summary. DO NOT call the same tool again in a loop.";

fn persona(
    id: &str,
    name: &str,
    description: &str,
    system_prompt_segment: String,
    is_pro: bool,
    slogan: &str,
    placeholder: &str,
) -> Persona {
    Persona {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        system_prompt_segment,
        is_pro,
        slogan: slogan.to_string(),
        placeholder: placeholder.to_string(),
        is_custom: false,
    }
}

pub fn builtin_personas() -> Vec<Persona> {
    vec![
        persona(
            DEFAULT_PERSONA_ID,
            "MentorX",
            "Your all-in-one AI assistant. Capable of document analysis, web research, creative writing, and more.",
            "You are MentorX, a highly advanced AI mentor. Your goal is to be a helpful and supportive partner. You can answer questions, help with writing, analyze provided documents, and, when web access is enabled, research topics on the internet.".to_string(),
            false,
            "Your All-in-One AI Assistant",
            "Ask me to write, analyze a document, or research a topic...",
        ),
        persona(
            GAMEDEV_PERSONA_ID,
            "Game Dev Guru",
            "Your AI partner for creating 2D and 3D games. Helps you build, debug, and learn in a live game dev environment.",
            format!(
                "You are the Game Dev Guru, an AI expert in game development, integrated into an IDE.\n- Your goal is to help the user build a game by modifying files in their workspace.\n{WORKSPACE_WORKFLOW}"
            ),
            false,
            "Launch the interactive game dev console",
            "e.g., \"Create a player character in player.js\"",
        ),
        persona(
            SANDBOX_PERSONA_ID,
            "Code Sandbox",
            "A live coding environment for any project. The AI can read, write, and update files in your workspace automatically.",
            format!(
                "You are an AI assistant in a Code Sandbox, an interactive development environment.\n- Your goal is to help the user with their coding tasks by modifying files in their workspace.\n{WORKSPACE_WORKFLOW}"
            ),
            false,
            "Start a live coding session",
            "e.g., \"/execute create an HTML file with a button\"",
        ),
        persona(
            WIDGET_FACTORY_PERSONA_ID,
            "Widget Factory",
            "A creative space to generate and experiment with live UI components using AI.",
            "You are an AI assistant in a Widget Factory, an interactive UI design environment. Your primary goal is to help the user create and iteratively refine React JSX widgets through conversation.
**Critical Workflow**:
1. **Creation**: When the user asks to create a new component, you MUST use the `createWidget` tool with a clear, self-contained prompt.
2. **Modification**: When the user asks to change the currently selected widget, you MUST use the `updateWidget` tool with the `widgetId` of the active widget and a `newPrompt` that merges the change into the previous description.
3. **Chat Response**: After every tool call, respond with a brief, friendly confirmation message.
- **DO NOT** output JSX code in the chat. Use the provided tools exclusively.".to_string(),
            true,
            "Design & refine UI with AI chat",
            "e.g., \"Create a login form\"",
        ),
    ]
}

pub fn find_persona(id: &str) -> Option<Persona> {
    builtin_personas().into_iter().find(|persona| persona.id == id)
}

/// Falls back to the default persona for unknown ids.
pub fn persona_or_default(id: &str) -> Persona {
    find_persona(id).unwrap_or_else(default_persona)
}

pub fn default_persona() -> Persona {
    builtin_personas()
        .into_iter()
        .next()
        .unwrap_or_else(|| {
            persona(
                DEFAULT_PERSONA_ID,
                "MentorX",
                "",
                String::new(),
                false,
                "",
                "",
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogs_follow_persona() {
        assert_eq!(
            find_persona(SANDBOX_PERSONA_ID).unwrap().tool_catalog(),
            ToolCatalog::Workspace
        );
        assert_eq!(
            find_persona(GAMEDEV_PERSONA_ID).unwrap().tool_catalog(),
            ToolCatalog::Workspace
        );
        assert_eq!(
            find_persona(WIDGET_FACTORY_PERSONA_ID).unwrap().tool_catalog(),
            ToolCatalog::Widgets
        );
        assert_eq!(default_persona().tool_catalog(), ToolCatalog::None);
    }

    #[test]
    fn unknown_persona_falls_back_to_default() {
        assert_eq!(persona_or_default("pirate").id, DEFAULT_PERSONA_ID);
    }

    #[test]
    fn persona_serializes_prompt_segment_in_snake_case() {
        let value = serde_json::to_value(default_persona()).unwrap();
        assert!(value["system_prompt_segment"]
            .as_str()
            .unwrap()
            .starts_with("You are MentorX"));
    }
}
