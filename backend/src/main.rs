use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

mod config;
mod db;
mod handlers;
mod middleware;
mod models;
mod services;

use config::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!("Starting server at {}:{}", config.host, config.port);

    let pool = db::connect(&config.database_url, config.max_connections)
        .await
        .map_err(|e| {
            log::error!("Failed to create database pool: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?;

    db::migrate(&pool).await.map_err(|e| {
        log::error!("Failed to run migrations: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    log::info!("Database migrations completed");

    let bind_host = config.host.clone();
    let bind_port = config.port;
    let allowed_origins = config.cors_origins.clone();

    let app_state = web::Data::new(models::AppState { db: pool, config });

    HttpServer::new(move || {
        let allowed_origins = allowed_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                let origin_str = origin.to_str().unwrap_or("");
                allowed_origins.iter().any(|allowed| origin_str.starts_with(allowed))
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec!["Authorization", "Content-Type"])
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(handlers::configure_routes)
    })
    .bind((bind_host.as_str(), bind_port))?
    .run()
    .await
}
