pub mod config;
pub mod inference;
pub mod models;
pub mod routes;

use std::sync::Arc;

use actix_files::Files;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use log::{info, warn};

use config::ServerConfig;
use inference::ModelInference;
use routes::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_module_path(false)
        .init();

    info!("Starting traffic accident severity API");

    let config = ServerConfig::from_env();

    // A missing model keeps the server up; /health reports it and /predict answers 500.
    let model = match ModelInference::load(&config.model_path) {
        Ok(model) => {
            info!(
                "Model loaded from {} ({} features)",
                config.model_path.display(),
                model.feature_names().len()
            );
            Some(Arc::new(model))
        }
        Err(e) => {
            warn!("Model not loaded: {:#}", e);
            None
        }
    };

    let state = web::Data::new(AppState {
        model,
        model_path: config.model_path.display().to_string(),
        static_dir: config.static_dir.clone(),
    });

    let bind_address = config.bind_address();
    let static_dir = config.static_dir.clone();

    info!("Listening on http://{}", bind_address);
    info!("Workers: {}", config.workers);
    info!("   GET  /          - prediction form");
    info!("   GET  /health    - model status");
    info!("   POST /predict   - severity prediction");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .app_data(state.clone())
            .app_data(routes::json_config())
            .configure(routes::configure)
            .service(Files::new("/static", &static_dir).prefer_utf8(true))
            .default_service(web::route().to(routes::not_found))
    })
    .workers(config.workers)
    .bind(&bind_address)?
    .run()
    .await
}
