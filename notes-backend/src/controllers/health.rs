use actix_web::{web, HttpResponse, Responder};

use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health/").route(web::get().to(health_check)));
    cfg.service(web::resource("/api/version/").route(web::get().to(get_version)));
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let database_ok = state.db.conn().is_ok();

    let body = serde_json::json!({
        "status": if database_ok { "ok" } else { "degraded" },
        "version": VERSION,
        "uptime_secs": state.started_at.elapsed().as_secs(),
    });

    if database_ok {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

async fn get_version() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "version": VERSION
    }))
}
