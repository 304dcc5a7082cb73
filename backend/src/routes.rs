use actix_cors::Cors;
use actix_web::{web, HttpResponse};
use shared::MessageResponse;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::services::Services;
use crate::{analysis, detection, profile};

pub const LIVENESS_MESSAGE: &str = "Acne Tracker Analysis API is running.";

/// Registers configuration, collaborators and every endpoint on an app.
pub fn configure_app(
    cfg: &mut web::ServiceConfig,
    config: web::Data<AppConfig>,
    services: &Services,
) {
    cfg.app_data(config)
        .app_data(web::Data::from(services.profile_store.clone()))
        .app_data(web::Data::from(services.correlation.clone()))
        .app_data(web::Data::from(services.detection.clone()))
        .app_data(json_config());
    configure_routes(cfg);
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(read_root)));
    profile::routes::configure_routes(cfg);
    analysis::routes::configure_routes(cfg);
    detection::routes::configure_routes(cfg);
}

pub fn cors(origins: &[String]) -> Cors {
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

/// Rejected JSON bodies surface as 422 with the parser's explanation.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::Validation(err.to_string()).into())
}

pub async fn read_root() -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse::new(LIVENESS_MESSAGE))
}
