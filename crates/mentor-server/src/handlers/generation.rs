use actix_web::{web, HttpResponse};
use mentor_llm::{
    ClassifyIntentRequest, ClassifyIntentResponse, ImagePromptRequest, ImagePromptResponse,
    ImageRequest, ImageResponse, WidgetRequest, WidgetResponse,
};
use tokio_util::sync::CancellationToken;

use super::require_text;
use crate::error::ApiError;
use crate::logging::Timer;
use crate::state::AppState;

pub async fn image(
    state: web::Data<AppState>,
    request: web::Json<ImageRequest>,
) -> Result<HttpResponse, ApiError> {
    let gateway = state.gateway()?;
    require_text("prompt", &request.prompt)?;

    let _timer = Timer::new("image generation");
    let images = gateway
        .generate_images(&request, &CancellationToken::new())
        .await?;
    Ok(HttpResponse::Ok().json(ImageResponse { images }))
}

pub async fn image_prompt(
    state: web::Data<AppState>,
    request: web::Json<ImagePromptRequest>,
) -> Result<HttpResponse, ApiError> {
    let gateway = state.gateway()?;
    require_text("modificationPrompt", &request.modification_prompt)?;
    require_text("image.data", &request.image.data)?;

    let _timer = Timer::new("image prompt");
    let prompt = gateway
        .image_prompt(&request, &CancellationToken::new())
        .await?;
    Ok(HttpResponse::Ok().json(ImagePromptResponse { prompt }))
}

pub async fn widget(
    state: web::Data<AppState>,
    request: web::Json<WidgetRequest>,
) -> Result<HttpResponse, ApiError> {
    let gateway = state.gateway()?;
    require_text("prompt", &request.prompt)?;

    let _timer = Timer::new("widget generation");
    let jsx = gateway
        .generate_widget(&request.prompt, &CancellationToken::new())
        .await?;
    Ok(HttpResponse::Ok().json(WidgetResponse { jsx }))
}

pub async fn classify_intent(
    state: web::Data<AppState>,
    request: web::Json<ClassifyIntentRequest>,
) -> Result<HttpResponse, ApiError> {
    let gateway = state.gateway()?;
    require_text("prompt", &request.prompt)?;

    let intent = gateway
        .classify_intent(&request.prompt, &CancellationToken::new())
        .await?;
    Ok(HttpResponse::Ok().json(ClassifyIntentResponse { intent }))
}
