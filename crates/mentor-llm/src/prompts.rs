//! Prompt templates sent to the hosted model.

use std::sync::OnceLock;

use mentor_core::{ModelParams, Persona, ToolSchema};
use regex::Regex;

use crate::types::CodeAction;

pub const DEFAULT_TOP_P: f32 = 0.95;

/// Sampling defaults: deep analysis runs cooler.
pub fn effective_temperature(params: &ModelParams, deep_analysis: bool) -> f32 {
    params
        .temperature
        .unwrap_or(if deep_analysis { 0.5 } else { 0.7 })
}

pub fn effective_top_p(params: &ModelParams) -> f32 {
    params.top_p.unwrap_or(DEFAULT_TOP_P)
}

pub fn system_instruction(
    persona: &Persona,
    web_access: bool,
    cost_saver: bool,
    deep_analysis: bool,
    custom_instruction: &str,
) -> String {
    let custom = if custom_instruction.trim().is_empty() {
        String::new()
    } else {
        format!(
            "CRITICAL USER-DEFINED INSTRUCTION: You MUST follow this directive: \"{}\"",
            custom_instruction.trim()
        )
    };
    let web = if web_access {
        "Web access is enabled. Use Google Search for current info and cite sources."
    } else {
        "Web access is disabled."
    };
    let brevity = if cost_saver {
        "Priority: EXTREME BREVITY. Be as concise as possible."
    } else {
        "Provide comprehensive, natural responses."
    };
    let style = if deep_analysis {
        "CRITICAL: DEEP ANALYSIS MODE. Provide expert-level, detailed responses."
    } else {
        brevity
    };

    format!(
        "{}\n\n{}\n\nCore Directives:\n1. Formatting: Use markdown.\n2. Web Access: {}\n3. Response Style: {}",
        persona.system_prompt_segment, custom, web, style
    )
}

pub fn code_suggestion_prompt(
    action: CodeAction,
    language: &str,
    code: &str,
    framework: Option<&str>,
) -> String {
    let target = match (action, framework) {
        (CodeAction::Test, Some(framework)) => {
            format!("Write {framework} unit tests for the following {language} code.")
        }
        (CodeAction::Test, None) => {
            format!("Write unit tests for the following {language} code.")
        }
        (action, _) => format!("Action: {} the following {} code.", action.as_str(), language),
    };
    format!(
        "{target} IMPORTANT: Respond ONLY with the raw code, without any markdown formatting or explanation.\n\nCODE:\n{code}"
    )
}

pub fn workspace_analysis_prompt(file_list: &[String]) -> String {
    format!(
        "Analyze this file structure and suggest 3 high-level improvements or next steps. File list: {}",
        file_list.join(", ")
    )
}

pub fn task_plan_prompt(goal: &str, tools: &[ToolSchema]) -> String {
    let mut catalog = String::new();
    for tool in tools {
        catalog.push_str(&format!(
            "\n- {}: {} Parameters: {}",
            tool.function.name, tool.function.description, tool.function.parameters
        ));
    }
    if catalog.is_empty() {
        catalog.push_str("\n- createFile, updateFile");
    }

    format!(
        "Create a step-by-step plan to achieve this programming goal: \"{goal}\".\n\
         Each step must name at most one tool call. Available tools:{catalog}\n\
         For every step that uses a tool, set toolCall.name to the tool name and \
         toolCall.arguments to a JSON object string with the tool's arguments."
    )
}

pub fn widget_prompt(prompt: &str) -> String {
    format!(
        "Generate a single React JSX component as a string for this prompt: \"{prompt}\". Use TailwindCSS for styling. The component must be self-contained. Respond ONLY with the raw JSX, starting with a div or fragment."
    )
}

pub fn image_edit_prompt(modification: &str) -> String {
    format!(
        "Based on the attached image, create a new detailed, photorealistic image prompt that incorporates this modification: \"{modification}\". The new prompt should describe the entire scene."
    )
}

pub fn classify_intent_prompt(prompt: &str) -> String {
    format!(
        "Is the user's primary intent \"image_generation\" or \"chat\"? Respond with ONLY one of those two options. User prompt: \"{prompt}\""
    )
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?m)^\s*```[A-Za-z0-9_+-]*[ \t]*\r?\n?|```").expect("fence regex is valid")
    })
}

/// Removes markdown code fences the model adds despite being told not to.
pub fn strip_code_fences(text: &str) -> String {
    fence_regex().replace_all(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_core::persona::default_persona;

    #[test]
    fn system_instruction_includes_directives() {
        let persona = default_persona();
        let instruction = system_instruction(&persona, true, false, false, "Speak like a pirate");

        assert!(instruction.starts_with(&persona.system_prompt_segment));
        assert!(instruction.contains("\"Speak like a pirate\""));
        assert!(instruction.contains("2. Web Access: Web access is enabled."));
        assert!(instruction.ends_with("Provide comprehensive, natural responses."));
    }

    #[test]
    fn deep_analysis_overrides_brevity() {
        let persona = default_persona();
        let instruction = system_instruction(&persona, false, true, true, "");

        assert!(instruction.contains("DEEP ANALYSIS MODE"));
        assert!(!instruction.contains("EXTREME BREVITY"));
        assert!(!instruction.contains("CRITICAL USER-DEFINED"));
    }

    #[test]
    fn sampling_defaults_depend_on_deep_analysis() {
        let params = ModelParams::default();
        assert_eq!(effective_temperature(&params, true), 0.5);
        assert_eq!(effective_temperature(&params, false), 0.7);
        assert_eq!(effective_top_p(&params), 0.95);

        let params = ModelParams {
            temperature: Some(0.1),
            top_p: Some(0.5),
            top_k: None,
        };
        assert_eq!(effective_temperature(&params, true), 0.1);
        assert_eq!(effective_top_p(&params), 0.5);
    }

    #[test]
    fn code_prompt_mentions_framework_for_tests() {
        let prompt = code_suggestion_prompt(CodeAction::Test, "javascript", "add()", Some("jest"));
        assert!(prompt.starts_with("Write jest unit tests for the following javascript code."));

        let prompt = code_suggestion_prompt(CodeAction::Refactor, "python", "x=1", None);
        assert!(prompt.starts_with("Action: refactor the following python code."));
        assert!(prompt.ends_with("CODE:\nx=1"));
    }

    #[test]
    fn strip_code_fences_handles_language_tags() {
        assert_eq!(
            strip_code_fences("```jsx\n<div>Hi</div>\n```"),
            "<div>Hi</div>"
        );
        assert_eq!(strip_code_fences("<div/>"), "<div/>");
        assert_eq!(
            strip_code_fences("```\nprint(1)\n```\n"),
            "print(1)"
        );
    }
}
