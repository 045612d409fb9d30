use actix_web::{get, web, HttpResponse, Responder};

use crate::models::{AppState, HealthResponse};

#[get("/health")]
pub async fn health(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        candidates: data.engine.candidates().to_vec(),
    })
}
