//! Routing of raw user input.

use mentor_core::{AiWidget, Persona};

const IMAGE_PREFIXES: &[&str] = &[
    "draw ",
    "generate an image",
    "generate image",
    "create an image",
    "paint ",
];

/// Words that make a chat prompt worth asking the model about image intent.
const IMAGE_HINTS: &[&str] = &["image", "picture", "photo", "drawing", "illustration"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Analyze,
    Run,
    Clear,
    /// A known command used without its argument.
    Usage(&'static str),
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Chat,
    Image { prompt: String },
    CreateWidget { prompt: String },
    UpdateWidget { widget_id: String, new_prompt: String },
    ExecuteTask { goal: String },
    Command(SlashCommand),
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

fn parse_command(input: &str) -> Intent {
    let body = input.trim_start_matches('/');
    let (name, argument) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };

    match name.to_ascii_lowercase().as_str() {
        "execute" if argument.is_empty() => {
            Intent::Command(SlashCommand::Usage("Usage: /execute <goal>"))
        }
        "execute" => Intent::ExecuteTask {
            goal: argument.to_string(),
        },
        "image" if argument.is_empty() => {
            Intent::Command(SlashCommand::Usage("Usage: /image <prompt>"))
        }
        "image" => Intent::Image {
            prompt: argument.to_string(),
        },
        "analyze" => Intent::Command(SlashCommand::Analyze),
        "run" => Intent::Command(SlashCommand::Run),
        "clear" => Intent::Command(SlashCommand::Clear),
        _ => Intent::Command(SlashCommand::Unknown(format!("/{name}"))),
    }
}

/// Decides what a user input should do.
///
/// Slash commands win. In the widget factory, input not starting with
/// "create" or "update" edits the active widget or creates a new one; inputs
/// with those verbs go to chat so the model can call the widget tools.
/// Elsewhere, image phrasing goes to image generation.
pub fn classify_input(input: &str, persona: &Persona, active_widget: Option<&AiWidget>) -> Intent {
    let input = input.trim();

    if input.starts_with('/') {
        return parse_command(input);
    }

    if persona.is_widget_factory() {
        if starts_with_ignore_case(input, "create") || starts_with_ignore_case(input, "update") {
            return Intent::Chat;
        }
        return match active_widget {
            Some(widget) => Intent::UpdateWidget {
                widget_id: widget.id.clone(),
                new_prompt: format!("{}, {}", widget.prompt, input),
            },
            None => Intent::CreateWidget {
                prompt: input.to_string(),
            },
        };
    }

    if IMAGE_PREFIXES
        .iter()
        .any(|prefix| starts_with_ignore_case(input, prefix))
    {
        return Intent::Image {
            prompt: input.to_string(),
        };
    }

    Intent::Chat
}

/// True when a chat prompt mentions images without using a lexical trigger.
pub fn mentions_images(input: &str) -> bool {
    let lower = input.to_lowercase();
    IMAGE_HINTS.iter().any(|hint| lower.contains(hint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_core::persona::{find_persona, default_persona, WIDGET_FACTORY_PERSONA_ID};

    fn widget_factory() -> Persona {
        find_persona(WIDGET_FACTORY_PERSONA_ID).unwrap()
    }

    #[test]
    fn slash_commands() {
        let persona = default_persona();
        assert_eq!(
            classify_input("/execute build a todo app", &persona, None),
            Intent::ExecuteTask {
                goal: "build a todo app".to_string()
            }
        );
        assert_eq!(
            classify_input("/execute", &persona, None),
            Intent::Command(SlashCommand::Usage("Usage: /execute <goal>"))
        );
        assert_eq!(
            classify_input("/image a red fox", &persona, None),
            Intent::Image {
                prompt: "a red fox".to_string()
            }
        );
        assert_eq!(
            classify_input("/RUN", &persona, None),
            Intent::Command(SlashCommand::Run)
        );
        assert_eq!(
            classify_input("/deploy now", &persona, None),
            Intent::Command(SlashCommand::Unknown("/deploy".to_string()))
        );
    }

    #[test]
    fn widget_factory_routes_to_active_widget() {
        let persona = widget_factory();
        let widget = AiWidget::new("a clock", "<div/>");

        assert_eq!(
            classify_input("make it red", &persona, Some(&widget)),
            Intent::UpdateWidget {
                widget_id: widget.id.clone(),
                new_prompt: "a clock, make it red".to_string()
            }
        );
        assert_eq!(
            classify_input("a weather card", &persona, None),
            Intent::CreateWidget {
                prompt: "a weather card".to_string()
            }
        );
    }

    #[test]
    fn widget_factory_verbs_go_to_chat() {
        let persona = widget_factory();
        let widget = AiWidget::new("a clock", "<div/>");
        assert_eq!(
            classify_input("Create a login form", &persona, Some(&widget)),
            Intent::Chat
        );
        assert_eq!(classify_input("update the clock", &persona, None), Intent::Chat);
        // No image routing inside the widget factory.
        assert!(matches!(
            classify_input("draw a cat", &persona, None),
            Intent::CreateWidget { .. }
        ));
    }

    #[test]
    fn image_prefixes() {
        let persona = default_persona();
        assert!(matches!(
            classify_input("Draw a cat on a skateboard", &persona, None),
            Intent::Image { .. }
        ));
        assert!(matches!(
            classify_input("generate an image of mountains", &persona, None),
            Intent::Image { .. }
        ));
        assert_eq!(classify_input("drawing tips?", &persona, None), Intent::Chat);
        assert_eq!(classify_input("hello", &persona, None), Intent::Chat);
    }

    #[test]
    fn image_hints() {
        assert!(mentions_images("Could you make me a picture of a dog?"));
        assert!(!mentions_images("Explain borrow checking"));
    }
}
