use actix_web::{get, post, web, HttpResponse, Responder};
use log::error;

use crate::error::WordError;
use crate::models::{AppState, Difficulty, HintResponse, Theme, WordQuery, WordRequest};

fn word_error_response(err: WordError) -> HttpResponse {
    error!("Error in word generation: {}", err);
    HttpResponse::ServiceUnavailable().json(HintResponse::failed(err.to_string()))
}

#[post("/word")]
pub async fn post_word(
    data: web::Data<AppState>,
    body: web::Json<WordQuery>,
) -> impl Responder {
    let query = body.into_inner();
    match data.engine.next_word(query.request, query.user_id.as_deref()).await {
        Ok(word) => HttpResponse::Ok().json(word),
        Err(err) => word_error_response(err),
    }
}

/// Smoke test against the live model candidates
#[get("/test-word")]
pub async fn test_word(data: web::Data<AppState>) -> impl Responder {
    let request = WordRequest {
        difficulty: Difficulty::Easy,
        theme: Theme::Current,
        exclude_words: Vec::new(),
    };
    match data.engine.generate_word(&request).await {
        Ok(word) => HttpResponse::Ok().json(word),
        Err(err) => word_error_response(err),
    }
}
