use actix_web::{HttpResponse, Responder};

/// Liveness probe; answers even without an upstream credential.
pub async fn handler() -> impl Responder {
    HttpResponse::Ok().body("OK")
}
