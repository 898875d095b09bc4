use std::future::Future;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use colored::Colorize;
use mentor_core::persona::builtin_personas;
use mentor_core::{Attachment, Message, Role, RunOutcome, Session, SessionError, SessionEvent};
use mentor_loop::{CodeActionOutcome, ConversationManager};
use tokio::sync::mpsc;

use crate::attachments::{load_attachment, save_attachment};
use crate::commands::{parse_local, LocalCommand, HELP};
use crate::render::{print_chats, print_event, print_reply, print_task};

/// Awaits `future` while printing the session's progress events. Ctrl-C
/// stops the in-flight model call, or the running task, and the future then
/// settles on its own. Returns the output and whether reply text streamed.
pub async fn drive<T>(
    manager: &ConversationManager,
    session_id: &str,
    events: &mut mpsc::Receiver<SessionEvent>,
    future: impl Future<Output = T>,
) -> (T, bool) {
    // Leftovers from commands that ran without a printer.
    while events.try_recv().is_ok() {}

    tokio::pin!(future);
    let mut streamed = false;
    let mut stopping = false;

    let output = loop {
        tokio::select! {
            biased;
            Some(event) = events.recv() => streamed |= print_event(event),
            output = &mut future => break output,
            _ = tokio::signal::ctrl_c(), if !stopping => {
                stopping = true;
                if !manager.stop_generation(session_id) && manager.is_task_running(session_id) {
                    if let Err(error) = manager.cancel_task(session_id).await {
                        log::warn!("Failed to cancel task: {}", error);
                    }
                }
            }
        }
    };

    // Events sent right before the future settled.
    while let Ok(event) = events.try_recv() {
        streamed |= print_event(event);
    }
    (output, streamed)
}

/// Prints a reply. A stopped generation is not an error.
pub fn show_reply(reply: Result<Message, SessionError>, streamed: bool) -> anyhow::Result<()> {
    match reply {
        Ok(message) => {
            print_reply(&message, streamed);
            Ok(())
        }
        Err(SessionError::Cancelled) => {
            println!();
            println!("{}", "⏹  Stopped".yellow());
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}

pub struct Repl {
    manager: Arc<ConversationManager>,
    events: mpsc::Receiver<SessionEvent>,
    session_id: String,
    pending_attachment: Option<Attachment>,
}

impl Repl {
    pub fn new(
        manager: Arc<ConversationManager>,
        events: mpsc::Receiver<SessionEvent>,
        session_id: String,
    ) -> Self {
        Self {
            manager,
            events,
            session_id,
            pending_attachment: None,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        let session = self.snapshot().await?;
        println!("{}", "🤖 MentorX".cyan().bold());
        println!("{}", format!("Session {} ({})", session.id, session.persona_id).dimmed());
        println!("{}", "Type :help for commands, :quit to leave".dimmed());
        println!();

        loop {
            let prompt = if self.pending_attachment.is_some() {
                "You 📎:"
            } else {
                "You:"
            };
            print!("{} ", prompt.cyan().bold());
            io::stdout().flush()?;

            let mut input = String::new();
            if io::stdin().read_line(&mut input)? == 0 {
                break;
            }
            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match self.handle_line(input).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(error) => println!("{}", format!("❌ {}", error).red()),
            }
        }

        println!("{}", "👋 Goodbye!".cyan());
        Ok(())
    }

    /// Returns false when the user asked to leave.
    pub async fn handle_line(&mut self, line: &str) -> anyhow::Result<bool> {
        match parse_local(line) {
            Some(Ok(LocalCommand::Quit)) => Ok(false),
            Some(Ok(command)) => {
                self.handle_local(command).await?;
                Ok(true)
            }
            Some(Err(usage)) => {
                println!("{}", usage.yellow());
                Ok(true)
            }
            None => {
                self.send(line).await?;
                Ok(true)
            }
        }
    }

    pub async fn send(&mut self, text: &str) -> anyhow::Result<()> {
        let attachment = self.pending_attachment.take();
        println!("{}", "MentorX:".green().bold());

        let (reply, streamed) = drive(
            &self.manager,
            &self.session_id,
            &mut self.events,
            self.manager.send_message(&self.session_id, text, attachment),
        )
        .await;
        show_reply(reply, streamed)
    }

    async fn snapshot(&self) -> anyhow::Result<Session> {
        Ok(self.manager.snapshot(&self.session_id).await?)
    }

    async fn file_id(&self, name: &str) -> anyhow::Result<String> {
        let session = self.snapshot().await?;
        session
            .workspace
            .file_by_name(name)
            .map(|file| file.id.clone())
            .ok_or_else(|| anyhow!("No file named '{}'", name))
    }

    /// Accepts a full session id or an unambiguous prefix.
    async fn resolve_session(&self, id: &str) -> anyhow::Result<String> {
        let matches: Vec<_> = self
            .manager
            .list_chats()
            .await
            .into_iter()
            .filter(|chat| chat.id.starts_with(id))
            .collect();
        match matches.as_slice() {
            [chat] => Ok(chat.id.clone()),
            [] => Err(anyhow!("No chat matches '{}'", id)),
            _ => Err(anyhow!("'{}' matches {} chats", id, matches.len())),
        }
    }

    async fn handle_local(&mut self, command: LocalCommand) -> anyhow::Result<()> {
        let id = self.session_id.clone();
        match command {
            LocalCommand::Help => println!("{}", HELP),
            LocalCommand::Quit => {}

            LocalCommand::NewChat { persona } => {
                self.session_id = self.manager.new_chat(persona.as_deref()).await?;
                self.pending_attachment = None;
                println!("{}", format!("✨ New chat {}", self.session_id).cyan());
            }
            LocalCommand::Chats => {
                print_chats(&self.manager.list_chats().await, &self.session_id);
            }
            LocalCommand::Switch(target) => {
                self.session_id = self.resolve_session(&target).await?;
                let session = self.snapshot().await?;
                println!(
                    "{}",
                    format!("Switched to '{}' ({} messages)", session.title, session.messages.len())
                        .cyan()
                );
            }
            LocalCommand::Delete(target) => {
                let target = self.resolve_session(&target).await?;
                self.manager.delete_chat(&target).await?;
                println!("{}", format!("🗑  Deleted {}", target).dimmed());
                if target == self.session_id {
                    self.session_id = self.manager.new_chat(None).await?;
                    println!("{}", format!("✨ New chat {}", self.session_id).cyan());
                }
            }
            LocalCommand::Rename(title) => {
                self.manager.rename_chat(&id, &title).await?;
            }
            LocalCommand::Persona(persona_id) => {
                let persona = self.manager.set_persona(&id, &persona_id).await?;
                println!("{}", format!("🎭 {}: {}", persona.name, persona.slogan).cyan());
            }
            LocalCommand::Personas => {
                for persona in builtin_personas() {
                    println!(
                        "{}  {}  {}",
                        persona.id.bold(),
                        persona.name,
                        persona.description.dimmed()
                    );
                }
            }
            LocalCommand::Export { path } => {
                let markdown = self.manager.export_chat(&id).await?;
                match path {
                    Some(path) => {
                        std::fs::write(&path, markdown)
                            .with_context(|| format!("Cannot write {}", path))?;
                        println!("{}", format!("💾 Exported to {}", path).green());
                    }
                    None => println!("{}", markdown),
                }
            }

            LocalCommand::ToggleWeb => {
                let enabled = self.manager.toggle_web_access(&id).await?;
                println!("Web access {}", on_off(enabled));
            }
            LocalCommand::ToggleDeep => {
                let enabled = self.manager.toggle_deep_analysis(&id).await?;
                println!("Deep analysis {}", on_off(enabled));
            }
            LocalCommand::CostSaver(enabled) => {
                self.manager.set_cost_saver(enabled).await;
                println!("Cost saver {}", on_off(enabled));
            }
            LocalCommand::Instruction(text) => {
                self.manager.set_custom_instruction(&text).await;
                if text.is_empty() {
                    println!("{}", "Custom instruction cleared".dimmed());
                }
            }
            LocalCommand::Temperature(value) => {
                let mut params = self.snapshot().await?.model_params;
                params.temperature = Some(value);
                self.manager.set_model_params(&id, params).await?;
            }
            LocalCommand::Stats => {
                let stats = self.manager.efficiency_stats().await;
                let config = self.manager.config().await;
                let session = self.snapshot().await?;
                println!("Tokens this chat:   {}", session.total_tokens);
                println!("API calls avoided:  {}", stats.api_calls_avoided);
                println!("Tokens saved:       {}", stats.tokens_saved);
                println!("Cost saver:         {}", on_off(config.cost_saver));
            }

            LocalCommand::Regenerate => {
                println!("{}", "MentorX:".green().bold());
                let (reply, streamed) = drive(
                    &self.manager,
                    &id,
                    &mut self.events,
                    self.manager.regenerate(&id),
                )
                .await;
                show_reply(reply, streamed)?;
            }
            LocalCommand::Edit(text) => {
                let session = self.snapshot().await?;
                let last_user = session
                    .messages
                    .iter()
                    .rev()
                    .find(|message| message.role == Role::User)
                    .map(|message| message.id.clone())
                    .ok_or_else(|| anyhow!("Nothing to edit yet"))?;
                println!("{}", "MentorX:".green().bold());
                let (reply, streamed) = drive(
                    &self.manager,
                    &id,
                    &mut self.events,
                    self.manager.edit_message(&id, &last_user, &text),
                )
                .await;
                show_reply(reply, streamed)?;
            }
            LocalCommand::Attach(path) => {
                let attachment = load_attachment(Path::new(&path))?;
                println!(
                    "{}",
                    format!("📎 {} ({}) goes with your next message", attachment.name, attachment.mime_type)
                        .dimmed()
                );
                self.pending_attachment = Some(attachment);
            }
            LocalCommand::Save(path) => {
                let session = self.snapshot().await?;
                let attachment = session
                    .messages
                    .iter()
                    .rev()
                    .filter(|message| message.role == Role::Assistant)
                    .find_map(|message| message.attachment.as_ref())
                    .ok_or_else(|| anyhow!("No reply attachment to save"))?;
                let written = save_attachment(attachment, Path::new(&path))?;
                println!("{}", format!("💾 Wrote {} bytes to {}", written, path).green());
            }

            LocalCommand::Files => {
                let session = self.snapshot().await?;
                if session.workspace.is_empty() {
                    println!("{}", "Workspace is empty".dimmed());
                }
                for file in &session.workspace.files {
                    let marker = if session.workspace.active_file_id.as_deref() == Some(file.id.as_str()) {
                        "*"
                    } else {
                        " "
                    };
                    println!(
                        "{} {}  {}",
                        marker,
                        file.name.bold(),
                        format!("{} · {} lines", file.language, file.code.lines().count()).dimmed()
                    );
                }
            }
            LocalCommand::AddFile(path) => {
                let path = Path::new(&path);
                let code = std::fs::read_to_string(path)
                    .with_context(|| format!("Cannot read {}", path.display()))?;
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .ok_or_else(|| anyhow!("'{}' has no file name", path.display()))?;
                let file = self.manager.add_file(&id, &name, &code).await?;
                self.manager.set_active_file(&id, Some(&file.id)).await?;
                println!("{}", format!("📄 Added {} ({})", file.name, file.language).green());
            }
            LocalCommand::Show(name) => {
                let session = self.snapshot().await?;
                let file = session
                    .workspace
                    .file_by_name(&name)
                    .ok_or_else(|| anyhow!("No file named '{}'", name))?;
                println!("{}", format!("── {} ──", file.name).dimmed());
                println!("{}", file.code);
            }
            LocalCommand::Select(name) => {
                let file_id = self.file_id(&name).await?;
                self.manager.set_active_file(&id, Some(&file_id)).await?;
            }
            LocalCommand::RemoveFile(name) => {
                let file_id = self.file_id(&name).await?;
                let removed = self.manager.delete_file(&id, &file_id).await?;
                println!("{}", format!("🗑  Removed {}", removed.name).dimmed());
            }
            LocalCommand::MoveFile { from, to } => {
                let file_id = self.file_id(&from).await?;
                let renamed = self.manager.rename_file(&id, &file_id, &to).await?;
                println!("{}", format!("Renamed to {}", renamed.name).dimmed());
            }
            LocalCommand::CodeAction(action) => {
                let (outcome, _) = drive(
                    &self.manager,
                    &id,
                    &mut self.events,
                    self.manager.perform_code_action(&id, action),
                )
                .await;
                match outcome {
                    Ok(CodeActionOutcome::FileUpdated(file)) => {
                        println!("{}", format!("✏️  Updated {}", file.name).green());
                    }
                    Ok(CodeActionOutcome::FileCreated(file)) => {
                        println!("{}", format!("📄 Created {}", file.name).green());
                    }
                    Ok(CodeActionOutcome::Report(text)) => println!("{}", text),
                    Ok(CodeActionOutcome::Suggestions(suggestions)) => {
                        for (index, suggestion) in suggestions.iter().enumerate() {
                            println!("{}", format!("  {}. {}", index + 1, suggestion).cyan());
                        }
                    }
                    Err(SessionError::Cancelled) => println!("{}", "⏹  Stopped".yellow()),
                    Err(error) => return Err(error.into()),
                }
            }
            LocalCommand::Run => {
                match self.manager.run_workspace(&id).await? {
                    RunOutcome::Preview { entry } => {
                        println!("{}", format!("▶ Built a preview from '{}'", entry).green());
                    }
                    RunOutcome::NotPreviewable => {
                        println!("{}", "Nothing to preview: add an .html file".yellow());
                    }
                }
            }
            LocalCommand::Output => {
                let session = self.snapshot().await?;
                if session.workspace.output.is_empty() {
                    println!("{}", "No output".dimmed());
                } else {
                    println!("{}", session.workspace.output);
                }
            }
            LocalCommand::Reset => {
                self.manager.reset_workspace(&id).await?;
                println!("{}", "Workspace reset".dimmed());
            }

            LocalCommand::Widgets => {
                let session = self.snapshot().await?;
                if session.widgets.is_empty() {
                    println!("{}", "No widgets".dimmed());
                }
                let active = session.widgets.active().map(|widget| widget.id.clone());
                for widget in &session.widgets.widgets {
                    let marker = if active.as_deref() == Some(widget.id.as_str()) { "*" } else { " " };
                    println!("{} {}  {}", marker, widget.id.dimmed(), widget.prompt);
                }
            }
            LocalCommand::Widget(prompt) => {
                let (widget, _) = drive(
                    &self.manager,
                    &id,
                    &mut self.events,
                    self.manager.generate_widget(&id, &prompt),
                )
                .await;
                let widget = widget?;
                println!("{}", format!("🧩 Widget {}", widget.id).cyan());
                println!("{}", widget.markup);
            }
            LocalCommand::Pin(widget_id) => {
                if self.manager.pin_widget(&widget_id).await? {
                    println!("{}", "📌 Pinned".green());
                } else {
                    println!("{}", "Already pinned".dimmed());
                }
            }
            LocalCommand::Unpin(widget_id) => {
                if !self.manager.unpin_widget(&widget_id).await {
                    println!("{}", "Was not pinned".dimmed());
                }
            }
            LocalCommand::Dashboard => {
                let pinned = self.manager.dashboard().await;
                if pinned.is_empty() {
                    println!("{}", "Dashboard is empty".dimmed());
                }
                for widget in pinned {
                    println!("{}  {}", widget.id.dimmed(), widget.prompt.bold());
                }
            }

            LocalCommand::Task => match self.snapshot().await?.active_task {
                Some(task) => print_task(&task),
                None => println!("{}", "No active task".dimmed()),
            },
            LocalCommand::Resume => {
                let (task, _) = drive(
                    &self.manager,
                    &id,
                    &mut self.events,
                    self.manager.resume_task(&id, None),
                )
                .await;
                print_task(&task?);
            }
            LocalCommand::CancelTask => match drive(
                &self.manager,
                &id,
                &mut self.events,
                self.manager.cancel_task(&id),
            )
            .await
            .0?
            {
                Some(task) => print_task(&task),
                None => println!("{}", "No task to cancel".dimmed()),
            },
        }
        Ok(())
    }
}

fn on_off(enabled: bool) -> colored::ColoredString {
    if enabled {
        "on".green()
    } else {
        "off".dimmed()
    }
}
