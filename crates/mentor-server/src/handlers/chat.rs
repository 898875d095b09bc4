use actix_web::http::header;
use actix_web::{web, HttpResponse};
use futures::StreamExt;
use mentor_llm::{ChatFrame, ChatRequest};
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;
use crate::logging::Timer;
use crate::state::AppState;

fn sse_frame(frame: &ChatFrame) -> Option<web::Bytes> {
    match serde_json::to_string(frame) {
        Ok(json) => Some(web::Bytes::from(format!("data: {json}\n\n"))),
        Err(error) => {
            log::error!("Failed to encode chat frame: {}", error);
            None
        }
    }
}

/// Streams the reply as `data: <json>\n\n` frames. Failures before the first
/// byte are a JSON error response; failures mid-stream become an in-band
/// error frame that ends the stream.
pub async fn handler(
    state: web::Data<AppState>,
    request: web::Json<ChatRequest>,
) -> Result<HttpResponse, ApiError> {
    let gateway = state.gateway()?;
    let request = request.into_inner();
    log::info!(
        "Chat request: {} messages, persona {}, web access {}",
        request.history.len(),
        request.persona.id,
        request.is_web_access_enabled
    );

    let cancel = CancellationToken::new();
    let stream = gateway.chat_stream(&request, &cancel).await?;
    // Dropping the response body (client gone) cancels the upstream call.
    let guard = cancel.drop_guard();

    let body = async_stream::stream! {
        let _guard = guard;
        let _timer = Timer::new("chat stream");
        let mut stream = stream;
        let mut chunks = 0usize;

        while let Some(item) = stream.next().await {
            let (frame, last) = match item {
                Ok(chunk) => {
                    chunks += 1;
                    (ChatFrame::Chunk(chunk), false)
                }
                Err(error) => {
                    log::warn!("Chat stream failed after {} chunks: {}", chunks, error);
                    (ChatFrame::error(error.user_message()), true)
                }
            };
            if let Some(bytes) = sse_frame(&frame) {
                yield Ok::<_, actix_web::Error>(bytes);
            }
            if last {
                break;
            }
        }
        log::debug!("Chat stream finished with {} chunks", chunks);
    };

    Ok(HttpResponse::Ok()
        .append_header((header::CONTENT_TYPE, "text/event-stream"))
        .append_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(body))
}
