pub mod health;
pub mod hint;
pub mod word;

use actix_web::web;

/// Register every route on an actix `App`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(hint::post_hint)
        .service(hint::test_hint)
        .service(word::post_word)
        .service(word::test_word);
}
