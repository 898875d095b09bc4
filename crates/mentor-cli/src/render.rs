use std::io::{self, Write};

use colored::Colorize;
use mentor_core::session::SessionSummary;
use mentor_core::{Message, SessionEvent, Task, TaskStatus};

/// Prints one progress event. Returns true for streamed reply text.
pub fn print_event(event: SessionEvent) -> bool {
    match event {
        SessionEvent::Token { content } => {
            print!("{}", content.green());
            let _ = io::stdout().flush();
            return true;
        }
        SessionEvent::ToolStart {
            tool_name,
            arguments,
            ..
        } => {
            println!();
            println!("{}", format!("🔧 {}", tool_name).yellow());
            log::debug!("Tool arguments: {}", arguments);
        }
        SessionEvent::ToolComplete { result, .. } => {
            println!("{}", format!("✅ {}", result.summary).green());
        }
        SessionEvent::ToolError { error, .. } => {
            println!("{}", format!("❌ Tool error: {}", error).red());
        }
        SessionEvent::TaskUpdated { task } => {
            if task.status == TaskStatus::Planning {
                println!("{}", format!("🗺  Planning: {}", task.goal).cyan());
            }
        }
        // Replies, errors included, are printed from the returned message.
        SessionEvent::Complete { .. } | SessionEvent::Error { .. } => {}
    }
    false
}

pub fn print_reply(message: &Message, streamed: bool) {
    if message.is_error {
        if streamed {
            println!();
        }
        println!("{}", format!("❌ {}", message.text).red());
        return;
    }
    if streamed {
        println!();
    } else {
        println!("{}", message.text.green());
    }
    if let Some(attachment) = &message.attachment {
        println!(
            "{}",
            format!("📎 {} ({} bytes). Use :save <path>", attachment.name, attachment.size).dimmed()
        );
    }
    if let Some(sources) = message.sources.as_ref().filter(|s| !s.is_empty()) {
        println!("{}", "Sources:".dimmed());
        for source in sources {
            println!("{}", format!("  - {} <{}>", source.title, source.uri).dimmed());
        }
    }
    if let Some(actions) = message.suggested_actions.as_ref().filter(|a| !a.is_empty()) {
        for (index, action) in actions.iter().enumerate() {
            println!("{}", format!("  {}. {}", index + 1, action).cyan());
        }
    }
    let mut footer = Vec::new();
    if message.is_cached {
        footer.push("cached".to_string());
    }
    if let Some(tokens) = message.token_count {
        footer.push(format!("{} tokens", tokens));
    }
    if !footer.is_empty() {
        println!("{}", format!("[{}]", footer.join(", ")).dimmed());
    }
}

pub fn print_task(task: &Task) {
    let status = match task.status {
        TaskStatus::Planning => "planning".yellow(),
        TaskStatus::InProgress => "in progress".yellow(),
        TaskStatus::Completed => "completed".green(),
        TaskStatus::Failed => "failed".red(),
    };
    println!("{} {} ({})", "Task:".cyan().bold(), task.goal, status);
    println!("{}", task.format_checklist());
    if let Some(error) = &task.error {
        println!("{}", format!("Error: {}", error).red());
    }
}

pub fn print_chats(chats: &[SessionSummary], current: &str) {
    if chats.is_empty() {
        println!("{}", "No chats yet".dimmed());
        return;
    }
    for chat in chats {
        let marker = if chat.id == current { "*" } else { " " };
        println!(
            "{} {}  {}  {}",
            marker,
            chat.id.dimmed(),
            chat.title.bold(),
            format!(
                "[{}] {} messages, {} tokens, {}",
                chat.persona_id,
                chat.message_count,
                chat.total_tokens,
                chat.created_at.format("%Y-%m-%d %H:%M")
            )
            .dimmed()
        );
    }
}
