use std::io;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};

use crate::config::{ServerConfig, MAX_BODY_BYTES};
use crate::error::ApiError;
use crate::handlers;
use crate::state::AppState;

/// Routes under `/api`. The caller provides `web::Data<AppState>`.
pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(MAX_BODY_BYTES)
            .error_handler(|error, _req| ApiError::BadRequest(error.to_string()).into()),
    )
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health::handler))
            .route("/chat", web::post().to(handlers::chat::handler))
            .route("/image", web::post().to(handlers::generation::image))
            .route(
                "/image-prompt",
                web::post().to(handlers::generation::image_prompt),
            )
            .route("/widget", web::post().to(handlers::generation::widget))
            .route(
                "/classify-intent",
                web::post().to(handlers::generation::classify_intent),
            )
            .route(
                "/code-suggestion",
                web::post().to(handlers::workspace::code_suggestion),
            )
            .route(
                "/workspace-analysis",
                web::post().to(handlers::workspace::workspace_analysis),
            )
            .route("/task-plan", web::post().to(handlers::workspace::task_plan)),
    );
}

pub async fn run_server(config: ServerConfig) -> io::Result<()> {
    let state = web::Data::new(AppState::from_config(&config));
    log::info!(
        "Starting MentorX server on port {} (model {}, configured: {})",
        config.port,
        config.model,
        state.is_configured()
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Cors::permissive())
            .configure(app_config)
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await
}
