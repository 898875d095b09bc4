use actix_web::{web, HttpResponse};
use mentor_llm::{
    CodeSuggestionRequest, CodeSuggestionResponse, TaskPlanRequest, TaskPlanResponse,
    WorkspaceAnalysisRequest, WorkspaceAnalysisResponse,
};
use tokio_util::sync::CancellationToken;

use super::require_text;
use crate::error::ApiError;
use crate::logging::Timer;
use crate::state::AppState;

pub async fn code_suggestion(
    state: web::Data<AppState>,
    request: web::Json<CodeSuggestionRequest>,
) -> Result<HttpResponse, ApiError> {
    let gateway = state.gateway()?;
    log::info!(
        "Code suggestion: {} on {} bytes of {}",
        request.action.as_str(),
        request.code.len(),
        request.language
    );

    let _timer = Timer::new("code suggestion");
    let suggestion = gateway
        .code_suggestion(&request, &CancellationToken::new())
        .await?;
    Ok(HttpResponse::Ok().json(CodeSuggestionResponse { suggestion }))
}

pub async fn workspace_analysis(
    state: web::Data<AppState>,
    request: web::Json<WorkspaceAnalysisRequest>,
) -> Result<HttpResponse, ApiError> {
    let gateway = state.gateway()?;

    let _timer = Timer::new("workspace analysis");
    let suggestions = gateway
        .workspace_analysis(&request.file_list, &CancellationToken::new())
        .await?;
    Ok(HttpResponse::Ok().json(WorkspaceAnalysisResponse { suggestions }))
}

pub async fn task_plan(
    state: web::Data<AppState>,
    request: web::Json<TaskPlanRequest>,
) -> Result<HttpResponse, ApiError> {
    let gateway = state.gateway()?;
    require_text("goal", &request.goal)?;
    log::info!(
        "Planning '{}' with {} tools",
        request.goal,
        request.tools.len()
    );

    let _timer = Timer::new("task plan");
    let plan = gateway
        .task_plan(&request, &CancellationToken::new())
        .await?;
    Ok(HttpResponse::Ok().json(TaskPlanResponse { plan }))
}
