//! Local REPL commands. They start with `:` so they never collide with the
//! slash commands the conversation itself understands.

use mentor_loop::WorkspaceCodeAction;

#[derive(Debug, Clone, PartialEq)]
pub enum LocalCommand {
    Help,
    Quit,

    // sessions
    NewChat { persona: Option<String> },
    Chats,
    Switch(String),
    Delete(String),
    Rename(String),
    Persona(String),
    Personas,
    Export { path: Option<String> },

    // settings
    ToggleWeb,
    ToggleDeep,
    CostSaver(bool),
    Instruction(String),
    Temperature(f32),
    Stats,

    // messaging
    Regenerate,
    Edit(String),
    Attach(String),
    Save(String),

    // workspace
    Files,
    AddFile(String),
    Show(String),
    Select(String),
    RemoveFile(String),
    MoveFile { from: String, to: String },
    CodeAction(WorkspaceCodeAction),
    Run,
    Output,
    Reset,

    // widgets
    Widgets,
    Widget(String),
    Pin(String),
    Unpin(String),
    Dashboard,

    // tasks
    Task,
    Resume,
    CancelTask,
}

pub const HELP: &str = "\
Sessions   :new [persona]  :chats  :switch <id>  :delete <id>  :rename <title>
           :persona <id>  :personas  :export [path]
Settings   :web  :deep  :costsaver on|off  :instruction <text>  :temp <0..2>  :stats
Messages   :regen  :edit <text>  :attach <path>  :save <path>
Workspace  :files  :add <path>  :show <name>  :select <name>  :rm <name>  :mv <from> <to>
           :refactor  :debug  :document  :explain  :test [framework]  :analyze
           :run  :output  :reset
Widgets    :widgets  :widget <prompt>  :pin <id>  :unpin <id>  :dashboard
Tasks      :task  :resume  :cancel-task
           :help  :quit

Anything else is sent to the model. Slash commands (/execute, /image, /analyze,
/run, /clear) are handled by the conversation. Ctrl-C stops a running reply.";

fn required(name: &str, argument: &str) -> Result<String, String> {
    if argument.is_empty() {
        Err(format!("Usage: :{name} <{}>", argument_hint(name)))
    } else {
        Ok(argument.to_string())
    }
}

fn argument_hint(name: &str) -> &'static str {
    match name {
        "switch" | "delete" | "pin" | "unpin" => "id",
        "rename" => "title",
        "persona" => "persona id",
        "instruction" | "edit" => "text",
        "attach" | "save" | "add" => "path",
        "show" | "select" | "rm" => "file name",
        "widget" => "prompt",
        _ => "argument",
    }
}

fn optional(argument: &str) -> Option<String> {
    (!argument.is_empty()).then(|| argument.to_string())
}

/// Parses a line starting with `:`. Returns `None` for anything else.
pub fn parse_local(line: &str) -> Option<Result<LocalCommand, String>> {
    let body = line.trim().strip_prefix(':')?;
    let (name, argument) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };
    let name = name.to_ascii_lowercase();

    let command = match name.as_str() {
        "help" | "h" => Ok(LocalCommand::Help),
        "quit" | "q" | "exit" => Ok(LocalCommand::Quit),

        "new" => Ok(LocalCommand::NewChat {
            persona: optional(argument),
        }),
        "chats" => Ok(LocalCommand::Chats),
        "switch" => required(&name, argument).map(LocalCommand::Switch),
        "delete" => required(&name, argument).map(LocalCommand::Delete),
        "rename" => required(&name, argument).map(LocalCommand::Rename),
        "persona" => required(&name, argument).map(LocalCommand::Persona),
        "personas" => Ok(LocalCommand::Personas),
        "export" => Ok(LocalCommand::Export {
            path: optional(argument),
        }),

        "web" => Ok(LocalCommand::ToggleWeb),
        "deep" => Ok(LocalCommand::ToggleDeep),
        "costsaver" => match argument.to_ascii_lowercase().as_str() {
            "on" => Ok(LocalCommand::CostSaver(true)),
            "off" => Ok(LocalCommand::CostSaver(false)),
            _ => Err("Usage: :costsaver on|off".to_string()),
        },
        "instruction" => Ok(LocalCommand::Instruction(argument.to_string())),
        "temp" => match argument.parse::<f32>() {
            Ok(value) if (0.0..=2.0).contains(&value) => Ok(LocalCommand::Temperature(value)),
            _ => Err("Usage: :temp <0..2>".to_string()),
        },
        "stats" => Ok(LocalCommand::Stats),

        "regen" => Ok(LocalCommand::Regenerate),
        "edit" => required(&name, argument).map(LocalCommand::Edit),
        "attach" => required(&name, argument).map(LocalCommand::Attach),
        "save" => required(&name, argument).map(LocalCommand::Save),

        "files" => Ok(LocalCommand::Files),
        "add" => required(&name, argument).map(LocalCommand::AddFile),
        "show" => required(&name, argument).map(LocalCommand::Show),
        "select" => required(&name, argument).map(LocalCommand::Select),
        "rm" => required(&name, argument).map(LocalCommand::RemoveFile),
        "mv" => match argument.split_once(char::is_whitespace) {
            Some((from, to)) if !to.trim().is_empty() => Ok(LocalCommand::MoveFile {
                from: from.to_string(),
                to: to.trim().to_string(),
            }),
            _ => Err("Usage: :mv <from> <to>".to_string()),
        },
        "refactor" => Ok(LocalCommand::CodeAction(WorkspaceCodeAction::Refactor)),
        "debug" => Ok(LocalCommand::CodeAction(WorkspaceCodeAction::Debug)),
        "document" => Ok(LocalCommand::CodeAction(WorkspaceCodeAction::Document)),
        "explain" => Ok(LocalCommand::CodeAction(WorkspaceCodeAction::Explain)),
        "test" => Ok(LocalCommand::CodeAction(WorkspaceCodeAction::Test {
            framework: optional(argument),
        })),
        "analyze" => Ok(LocalCommand::CodeAction(WorkspaceCodeAction::Analyze)),
        "run" => Ok(LocalCommand::Run),
        "output" => Ok(LocalCommand::Output),
        "reset" => Ok(LocalCommand::Reset),

        "widgets" => Ok(LocalCommand::Widgets),
        "widget" => required(&name, argument).map(LocalCommand::Widget),
        "pin" => required(&name, argument).map(LocalCommand::Pin),
        "unpin" => required(&name, argument).map(LocalCommand::Unpin),
        "dashboard" => Ok(LocalCommand::Dashboard),

        "task" => Ok(LocalCommand::Task),
        "resume" => Ok(LocalCommand::Resume),
        "cancel-task" => Ok(LocalCommand::CancelTask),

        _ => Err(format!("Unknown command ':{name}'. Type :help")),
    };
    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_and_slash_commands_are_not_local() {
        assert!(parse_local("hello there").is_none());
        assert!(parse_local("/execute build a game").is_none());
    }

    #[test]
    fn parses_arguments() {
        assert_eq!(
            parse_local(":new sandbox"),
            Some(Ok(LocalCommand::NewChat {
                persona: Some("sandbox".to_string())
            }))
        );
        assert_eq!(
            parse_local(":new"),
            Some(Ok(LocalCommand::NewChat { persona: None }))
        );
        assert_eq!(
            parse_local(":rename   Rust   notes "),
            Some(Ok(LocalCommand::Rename("Rust   notes".to_string())))
        );
        assert_eq!(
            parse_local(":mv app.js main.js"),
            Some(Ok(LocalCommand::MoveFile {
                from: "app.js".to_string(),
                to: "main.js".to_string()
            }))
        );
        assert_eq!(
            parse_local(":test vitest"),
            Some(Ok(LocalCommand::CodeAction(WorkspaceCodeAction::Test {
                framework: Some("vitest".to_string())
            })))
        );
        assert_eq!(
            parse_local(":COSTSAVER on"),
            Some(Ok(LocalCommand::CostSaver(true)))
        );
    }

    #[test]
    fn reports_usage_errors() {
        assert_eq!(
            parse_local(":switch"),
            Some(Err("Usage: :switch <id>".to_string()))
        );
        assert!(matches!(parse_local(":mv only-one"), Some(Err(_))));
        assert!(matches!(parse_local(":temp 7"), Some(Err(_))));
        assert!(matches!(parse_local(":costsaver maybe"), Some(Err(_))));
        assert_eq!(
            parse_local(":frobnicate"),
            Some(Err("Unknown command ':frobnicate'. Type :help".to_string()))
        );
    }
}
