use acne_tracker_api::config::AppConfig;
use acne_tracker_api::routes::{configure_app, cors};
use acne_tracker_api::services::Services;
use actix_web::{middleware, web, App, HttpServer};
use std::env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let config = AppConfig::load().map_err(|e| {
        log::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    log::info!("Model weights path: {}", config.paths.model_weights.display());
    log::info!("Data source path: {}", config.paths.data_source.display());
    log::info!("Upload staging dir: {}", config.upload_dir().display());
    if !config.paths.model_weights.exists() {
        log::warn!(
            "Model file not found at expected path: {}",
            config.paths.model_weights.display()
        );
    }

    let services = Services::from_config(&config);
    if services.profile_store.is_available() {
        match services.profile_store.init().await {
            Ok(()) => log::info!("Profile store initialized."),
            Err(e) => log::error!("Error during profile store initialization: {:?}", e),
        }
    }

    let bind_address = config.bind_address();
    let config = web::Data::new(config);
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(cors(&config.server.cors_origins))
            .wrap(middleware::Logger::default())
            .configure(|cfg| configure_app(cfg, config.clone(), &services))
    })
    .bind(&bind_address)?
    .run()
    .await
}
