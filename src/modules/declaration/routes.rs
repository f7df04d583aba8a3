//! Route wiring for the declaration module.

use crate::modules::declaration::controller::{batch, declaration};
use actix_web::{web, HttpResponse, Responder, Result};
use serde_json::json;

/// Liveness probe.
#[actix_web::get("/health")]
pub async fn health() -> Result<impl Responder> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "bhxh-portal",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

pub fn configure_declaration_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(batch::create_batch)
        .service(batch::list_batches)
        .service(batch::get_batch)
        .service(batch::update_batch)
        .service(batch::delete_batch)
        .service(batch::submit_batch)
        .service(batch::approve_batch)
        .service(batch::reject_batch)
        .service(batch::confirm_payment)
        .service(batch::process_batch)
        .service(batch::complete_batch)
        .service(declaration::upsert_declaration)
        .service(declaration::delete_declaration)
        .service(declaration::delete_own_declaration)
        .service(declaration::search_declarations)
        .service(declaration::declaration_history);
}
