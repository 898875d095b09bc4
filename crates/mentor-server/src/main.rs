use std::io;
use std::time::Duration;

use clap::Parser;
use mentor_llm::providers::gemini::{DEFAULT_IMAGE_MODEL, DEFAULT_MODEL};
use mentor_server::logging::init_logging;
use mentor_server::{run_server, ServerConfig};

#[derive(Parser, Debug, Clone)]
#[command(name = "mentor-server")]
#[command(about = "MentorX model proxy")]
#[command(version)]
struct Cli {
    /// Enable debug mode
    #[arg(long, env = "DEBUG", default_value = "false")]
    debug: bool,

    /// Server port
    #[arg(long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Upstream model credential; without it model routes answer 503
    #[arg(long, env = "API_KEY")]
    api_key: Option<String>,

    /// Override of the upstream API base URL
    #[arg(long, env = "GEMINI_BASE_URL")]
    gemini_base_url: Option<String>,

    /// Text model
    #[arg(long, env = "MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Image model
    #[arg(long, env = "IMAGE_MODEL", default_value = DEFAULT_IMAGE_MODEL)]
    image_model: String,

    /// Per-call timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60")]
    request_timeout_secs: u64,

    /// Retries on transient upstream failures
    #[arg(long, env = "MAX_RETRIES", default_value = "3")]
    max_retries: u32,

    /// Log level (overrides debug flag)
    #[arg(long, env = "RUST_LOG")]
    log_level: Option<String>,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        let config = ServerConfig {
            port: self.port,
            gemini_base_url: self.gemini_base_url,
            model: self.model,
            image_model: self.image_model,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_retries: self.max_retries,
            ..ServerConfig::default()
        };
        config.with_api_key(self.api_key)
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();

    if cli.log_level.is_some() {
        env_logger::init();
    } else {
        init_logging(cli.debug);
    }

    if cli.debug {
        log::debug!("Debug mode enabled");
        log::debug!("  Port: {}", cli.port);
        log::debug!("  Base URL override: {:?}", cli.gemini_base_url);
        log::debug!("  Timeout: {}s, retries: {}", cli.request_timeout_secs, cli.max_retries);
    }

    run_server(cli.into_config()).await
}
