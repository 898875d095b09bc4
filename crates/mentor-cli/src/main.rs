use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use mentor_core::persona::builtin_personas;
use mentor_core::ClientConfig;
use mentor_llm::BackendGateway;
use mentor_loop::{ConversationManager, EventSink};
use tokio::sync::mpsc;

mod attachments;
mod commands;
mod render;
mod repl;

use repl::{drive, show_reply, Repl};

#[derive(Parser)]
#[command(name = "mentorx")]
#[command(about = "Terminal client for MentorX")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides config and MENTORX_BACKEND_URL)
    #[arg(long)]
    backend_url: Option<String>,

    /// Persona for the first chat
    #[arg(long, short)]
    persona: Option<String>,

    /// Enable debug mode
    #[arg(long, short, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive chat (default)
    Chat,
    /// Send a single message and print the reply
    Send {
        /// Message content
        message: String,
    },
    /// List the built-in personas
    Personas,
    /// Print the effective client configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let mut config = ClientConfig::load();
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
    }
    if cli.debug {
        eprintln!(
            "{}",
            format!("[DEBUG] Backend URL: {}", config.backend_url).dimmed()
        );
    }

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Personas => {
            for persona in builtin_personas() {
                let pro = if persona.is_pro { " (pro)" } else { "" };
                println!("{}{}  {}", persona.id.bold(), pro, persona.name);
                println!("    {}", persona.description.dimmed());
            }
            Ok(())
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Chat => {
            let (manager, rx) = build_manager(config);
            let session_id = manager.new_chat(cli.persona.as_deref()).await?;
            Repl::new(manager, rx, session_id).run().await
        }
        Commands::Send { message } => {
            let (manager, mut rx) = build_manager(config);
            let session_id = manager.new_chat(cli.persona.as_deref()).await?;
            let (reply, streamed) = drive(
                &manager,
                &session_id,
                &mut rx,
                manager.send_message(&session_id, &message, None),
            )
            .await;
            show_reply(reply, streamed)
        }
    }
}

fn build_manager(
    config: ClientConfig,
) -> (Arc<ConversationManager>, mpsc::Receiver<mentor_core::SessionEvent>) {
    let (tx, rx) = mpsc::channel(256);
    let gateway = Arc::new(BackendGateway::from_config(&config));
    let manager = ConversationManager::new(gateway, config).with_events(EventSink::new(tx));
    (Arc::new(manager), rx)
}
