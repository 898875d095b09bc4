use std::fmt::Write;

use mentor_core::persona::persona_or_default;
use mentor_core::{Role, Session};

/// Renders a conversation as a markdown document.
pub fn export_markdown(session: &Session) -> String {
    let persona = persona_or_default(&session.persona_id);
    let mut out = String::new();

    let _ = writeln!(out, "# {}\n", session.title);
    let _ = writeln!(
        out,
        "_Persona: {} | Exported {}_\n",
        persona.name,
        session.updated_at.format("%Y-%m-%d %H:%M UTC")
    );

    for message in &session.messages {
        let author = match message.role {
            Role::User => "You",
            Role::Assistant => "MentorX",
            Role::Tool => "Tool",
        };
        let _ = writeln!(
            out,
            "**{}** ({})\n",
            author,
            message.timestamp.format("%H:%M")
        );
        if !message.text.is_empty() {
            let _ = writeln!(out, "{}\n", message.text.trim_end());
        }
        if let Some(attachment) = &message.attachment {
            let _ = writeln!(out, "> Attachment: {}\n", attachment.name);
        }
        if let Some(sources) = message.sources.as_ref().filter(|s| !s.is_empty()) {
            out.push_str("Sources:\n");
            for source in sources {
                let _ = writeln!(out, "- [{}]({})", source.title, source.uri);
            }
            out.push('\n');
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_core::{Message, Source};

    #[test]
    fn renders_title_authors_and_sources() {
        let mut session = Session::new("s1");
        session.title = "Rust questions".to_string();
        session.add_message(Message::user("What is a lifetime?"));
        let mut reply = Message::assistant("A region of code where a reference is valid.");
        reply.sources = Some(vec![Source {
            uri: "https://doc.rust-lang.org/book/".to_string(),
            title: "The Book".to_string(),
        }]);
        session.add_message(reply);

        let markdown = export_markdown(&session);

        assert!(markdown.starts_with("# Rust questions\n"));
        assert!(markdown.contains("**You**"));
        assert!(markdown.contains("What is a lifetime?"));
        assert!(markdown.contains("**MentorX**"));
        assert!(markdown.contains("- [The Book](https://doc.rust-lang.org/book/)"));
    }
}
