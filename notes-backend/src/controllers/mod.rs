use actix_web::web;

pub mod accounts;
pub mod health;
pub mod notes_api;
pub mod notes_web;

/// Mount every controller's routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::config_routes)
        .configure(accounts::config)
        .configure(notes_api::config)
        .configure(notes_web::config);
}
