use actix_web::{web, HttpResponse};
use log::{error, info};
use shared::{MessageResponse, Profile};

use super::{ProfileRecord, ProfileStore};
use crate::error::{ApiError, CollaboratorError};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/profile/").route(web::post().to(save_profile)))
        .service(web::resource("/profile/{user_id}").route(web::get().to(get_profile)));
}

pub async fn save_profile(
    store: web::Data<dyn ProfileStore>,
    profile: web::Json<Profile>,
) -> Result<HttpResponse, ApiError> {
    if !store.is_available() {
        return Err(ApiError::FeatureUnavailable(
            "Profile saving feature not available.".into(),
        ));
    }

    let record = ProfileRecord::from(profile.into_inner());
    let user_id = record.user_id.clone();
    match store.save(record).await {
        Ok(()) => {
            info!("Saved profile for user {}", user_id);
            Ok(HttpResponse::Ok().json(MessageResponse::new("Profile saved successfully")))
        }
        Err(CollaboratorError::Unavailable) => Err(ApiError::FeatureUnavailable(
            "Profile saving feature not available.".into(),
        )),
        Err(e) => {
            error!("Error saving profile for user {}: {:?}", user_id, e);
            Err(ApiError::Internal("Failed to save profile.".into()))
        }
    }
}

pub async fn get_profile(
    store: web::Data<dyn ProfileStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    if !store.is_available() {
        return Err(ApiError::FeatureUnavailable(
            "Profile fetching feature not available.".into(),
        ));
    }

    let user_id = path.into_inner();
    match store.get(&user_id).await {
        Ok(Some(record)) => Ok(HttpResponse::Ok().json(record)),
        Ok(None) => {
            info!("Profile not found for user {}", user_id);
            Err(ApiError::NotFound("Profile not found".into()))
        }
        Err(CollaboratorError::Unavailable) => Err(ApiError::FeatureUnavailable(
            "Profile fetching feature not available.".into(),
        )),
        Err(e) => {
            error!("Error fetching profile for user {}: {:?}", user_id, e);
            Err(ApiError::Internal("Failed to fetch profile.".into()))
        }
    }
}
