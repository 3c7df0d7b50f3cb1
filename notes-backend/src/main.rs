use actix_cors::Cors;
use actix_web::middleware::{Logger, NormalizePath, TrailingSlash};
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

use notes_backend::config::Config;
use notes_backend::db::Database;
use notes_backend::{controllers, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    log::info!("Notes backend v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();

    log::info!("Initializing database at {}", config.database_url);
    let db = match Database::new(&config.database_url) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            log::error!("Failed to initialize database: {}", e);
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    match db.purge_expired_sessions() {
        Ok(n) if n > 0 => log::info!("Removed {} expired sessions", n),
        Ok(_) => {}
        Err(e) => log::warn!("Failed to purge expired sessions: {}", e),
    }

    let state = web::Data::new(AppState::new(Arc::clone(&db), config.clone()));
    let bind = (config.host.clone(), config.port);
    log::info!("Listening on http://{}:{}", bind.0, bind.1);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(NormalizePath::new(TrailingSlash::Always))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::configure)
    })
    .bind(bind)?
    .run();

    let server_handle = server.handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            log::warn!("Failed to listen for Ctrl+C");
            return;
        }
        log::info!("Received Ctrl+C, shutting down...");

        let server_stop = server_handle.stop(true);
        if tokio::time::timeout(std::time::Duration::from_secs(5), server_stop)
            .await
            .is_err()
        {
            log::warn!("Timeout waiting for HTTP server to stop, forcing exit...");
        }

        log::info!("Shutdown complete");
    });

    server.await
}
