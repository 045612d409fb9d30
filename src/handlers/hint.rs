use actix_web::{get, post, web, HttpResponse, Responder};
use log::{error, info};

use crate::error::{HintError, HintSpendError};
use crate::models::{AppState, HintQuery, HintRequest, HintResponse};

fn spend_error_response(err: HintSpendError) -> HttpResponse {
    match err {
        HintSpendError::NoHintsLeft => {
            HttpResponse::PaymentRequired().json(HintResponse::failed(err.to_string()))
        }
        HintSpendError::Hint(HintError::InvalidRequest(msg)) => {
            HttpResponse::BadRequest().json(HintResponse::failed(msg))
        }
        HintSpendError::Hint(err @ HintError::Exhausted(_)) => {
            error!("Error in hint generation: {}", err);
            HttpResponse::ServiceUnavailable().json(HintResponse::failed(err.to_string()))
        }
    }
}

#[post("/hint")]
pub async fn post_hint(
    data: web::Data<AppState>,
    body: web::Json<HintQuery>,
) -> impl Responder {
    let query = body.into_inner();
    let request = query.to_request();
    info!(
        "Hint requested for a {}-letter word, revealing {} (free: {})",
        request.word_length, request.reveal_count, query.is_free
    );

    match data
        .engine
        .use_hint(request, query.user_id.as_deref(), query.is_free)
        .await
    {
        Ok(result) => HttpResponse::Ok().json(HintResponse::granted(result)),
        Err(err) => spend_error_response(err),
    }
}

/// Smoke test against the live model candidates
#[get("/test-hint")]
pub async fn test_hint(data: web::Data<AppState>) -> impl Responder {
    let request = HintRequest::new("example", "xyz", 2);
    match data.engine.use_hint(request, None, true).await {
        Ok(result) => HttpResponse::Ok().json(HintResponse::granted(result)),
        Err(err) => spend_error_response(err),
    }
}
