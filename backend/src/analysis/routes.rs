use actix_web::{web, HttpResponse};
use log::{error, info};
use shared::AnalysisResponse;

use super::CorrelationEngine;
use crate::config::AppConfig;
use crate::error::{ApiError, CollaboratorError};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/analyze/").route(web::get().to(analyze_history)));
}

pub async fn analyze_history(
    config: web::Data<AppConfig>,
    engine: web::Data<dyn CorrelationEngine>,
) -> Result<HttpResponse, ApiError> {
    if !engine.is_available() {
        return Err(ApiError::FeatureUnavailable(
            "Correlation analysis feature not available.".into(),
        ));
    }

    let data_source = config.paths.data_source.as_path();
    info!("Analyzing database at: {}", data_source.display());
    if !tokio::fs::try_exists(data_source).await.unwrap_or(false) {
        return Err(ApiError::NotFound(format!(
            "Database file not found at required path: {}",
            data_source.display()
        )));
    }

    match engine.analyze(data_source).await {
        Ok((correlations, summary)) => Ok(HttpResponse::Ok().json(AnalysisResponse {
            correlations,
            summary,
        })),
        Err(CollaboratorError::NotFound(message)) => Err(ApiError::NotFound(message)),
        Err(CollaboratorError::Unavailable) => Err(ApiError::FeatureUnavailable(
            "Correlation analysis feature not available.".into(),
        )),
        Err(e) => {
            error!("Error during correlation analysis: {:?}", e);
            Err(ApiError::Internal(format!(
                "Failed during correlation analysis: {}",
                e
            )))
        }
    }
}
