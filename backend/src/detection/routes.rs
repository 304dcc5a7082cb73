use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use futures::{StreamExt, TryStreamExt};
use log::{debug, error, info, warn};
use shared::{DetectionResponse, ImageKind};
use std::path::Path;
use uuid::Uuid;

use super::heatmap::encode_png_base64;
use super::staging::{NormalizeError, StagedUpload};
use super::{DetectionEngine, DetectionOutcome};
use crate::config::AppConfig;
use crate::error::{ApiError, CollaboratorError};

const UPLOAD_FIELD: &str = "file";
const PROCESSING_FAILED: &str = "An error occurred while processing the image.";

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/detect").route(web::post().to(detect)));
}

/// The `file` part of a detection upload.
#[derive(Debug)]
pub struct ImageUpload {
    pub filename: Option<String>,
    pub kind: ImageKind,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    fn extension(&self) -> Option<&str> {
        self.filename
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
    }
}

pub async fn detect(
    config: web::Data<AppConfig>,
    engine: web::Data<dyn DetectionEngine>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    if !engine.is_available() {
        error!("Detection engine is not configured, cannot process request");
        return Err(ApiError::FeatureUnavailable(
            "Detection analysis feature is not available.".into(),
        ));
    }

    let upload = read_upload(payload).await?;
    let upload_id = Uuid::new_v4();
    info!(
        "Detection request {} for {} ({}, {} bytes)",
        upload_id,
        upload.filename.as_deref().unwrap_or("<unnamed>"),
        upload.kind.mime(),
        upload.bytes.len()
    );

    let outcome = run_detection(&config, engine.get_ref(), &upload, upload_id).await?;
    let response = build_response(outcome)?;
    Ok(HttpResponse::Ok().json(response))
}

/// Reads the `file` part, rejecting disallowed media types before the body
/// is consumed. Other parts are drained and ignored.
async fn read_upload(mut payload: Multipart) -> Result<ImageUpload, ApiError> {
    while let Some(field) = payload
        .try_next()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            drain(field).await?;
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let declared = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| "none".to_string());
        let Some(kind) = ImageKind::from_content_type(&declared) else {
            warn!(
                "Rejected file type: {} for file: {}",
                declared,
                filename.as_deref().unwrap_or("<unnamed>")
            );
            return Err(ApiError::UnsupportedMediaType(format!(
                "Invalid file type '{}'. Please upload JPG, PNG, or BMP.",
                declared
            )));
        };

        let bytes = read_field(field).await?;
        if bytes.is_empty() {
            return Err(ApiError::BadRequest("Received empty file content.".into()));
        }
        return Ok(ImageUpload {
            filename,
            kind,
            bytes,
        });
    }

    Err(ApiError::BadRequest(format!(
        "Missing '{}' field in upload.",
        UPLOAD_FIELD
    )))
}

async fn read_field(mut field: Field) -> Result<Vec<u8>, ApiError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk =
            chunk.map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

async fn drain(field: Field) -> Result<(), ApiError> {
    read_field(field).await.map(|_| ())
}

/// Stages, normalizes and analyzes the upload. The staged file lives only
/// for the duration of this call.
async fn run_detection(
    config: &AppConfig,
    engine: &dyn DetectionEngine,
    upload: &ImageUpload,
    upload_id: Uuid,
) -> Result<Option<DetectionOutcome>, ApiError> {
    let staged = StagedUpload::create(&config.upload_dir(), upload.extension())
        .map_err(|e| internal(upload_id, "staging upload", &e))?;
    staged
        .write(&upload.bytes)
        .await
        .map_err(|e| internal(upload_id, "writing upload", &e))?;
    info!("Temporary image saved to: {}", staged.path().display());

    // The guard rides along into the blocking task so an abandoned request
    // cannot delete the file before the re-encode recreates it.
    let (staged, normalized) = web::block(move || staged.normalize())
        .await
        .map_err(|e| internal(upload_id, "normalizing upload", &e))?;
    match normalized {
        Ok((width, height)) => debug!(
            "Upload {} resized from {}x{} to model input size",
            upload_id, width, height
        ),
        Err(NormalizeError::Unreadable(reason)) => {
            warn!("Upload {} could not be decoded: {}", upload_id, reason);
            return Err(ApiError::BadRequest(
                "Could not read the uploaded image.".into(),
            ));
        }
        Err(e) => return Err(internal(upload_id, "re-encoding upload", &e)),
    }

    let model_path = config.paths.model_weights.as_path();
    if !tokio::fs::try_exists(model_path).await.unwrap_or(false) {
        error!(
            "Model file missing at analysis time: {}",
            model_path.display()
        );
        return Err(ApiError::ServiceUnavailable(
            "Required analysis model file is currently unavailable.".into(),
        ));
    }

    match engine.analyze_image(model_path, staged.path()).await {
        Ok(outcome) => Ok(outcome),
        Err(CollaboratorError::Unavailable) => Err(ApiError::FeatureUnavailable(
            "Detection analysis feature is not available.".into(),
        )),
        Err(e) => Err(internal(upload_id, "running detection", &e)),
    }
}

fn internal(upload_id: Uuid, stage: &str, err: &dyn std::fmt::Debug) -> ApiError {
    error!("Detection request {} failed while {}: {:?}", upload_id, stage, err);
    ApiError::Internal(PROCESSING_FAILED.into())
}

/// Maps the engine's report onto the response body.
fn build_response(outcome: Option<DetectionOutcome>) -> Result<DetectionResponse, ApiError> {
    let outcome = match outcome {
        Some(outcome) if outcome.success => outcome,
        Some(outcome) => {
            let message = outcome
                .message
                .unwrap_or_else(|| "Unknown analysis error".to_string());
            return Err(analysis_failure(message));
        }
        None => {
            return Err(analysis_failure(
                "Analysis function returned invalid data".to_string(),
            ));
        }
    };

    let heatmap_image_base64 = outcome.heatmap_overlay.as_ref().and_then(|buffer| {
        match encode_png_base64(buffer) {
            Ok(encoded) => {
                debug!("Heatmap image encoded ({} base64 chars)", encoded.len());
                Some(encoded)
            }
            Err(e) => {
                warn!("Omitting heatmap, encoding failed: {}", e);
                None
            }
        }
    });

    Ok(DetectionResponse {
        success: true,
        message: outcome
            .message
            .unwrap_or_else(|| "Analysis successful.".to_string()),
        severity_score: outcome.severity_score,
        percentage_area: outcome.percentage_area,
        average_intensity: outcome.average_intensity,
        lesion_count: outcome.lesion_count,
        heatmap_image_base64,
        detections: Some(outcome.detections),
        model_classes: outcome.model_classes,
    })
}

fn analysis_failure(message: String) -> ApiError {
    error!("Analysis failed or returned unsuccessful: {}", message);
    if message.to_lowercase().contains("not found") {
        ApiError::NotFound(message)
    } else {
        ApiError::Internal(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::HeatmapBuffer;

    fn successful() -> DetectionOutcome {
        DetectionOutcome {
            success: true,
            ..Default::default()
        }
    }

    #[test]
    fn missing_resource_messages_map_to_not_found() {
        let outcome = DetectionOutcome {
            success: false,
            message: Some("Model weights Not Found on disk".into()),
            ..Default::default()
        };
        assert!(matches!(build_response(Some(outcome)), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn other_failures_are_internal() {
        let outcome = DetectionOutcome {
            success: false,
            message: None,
            ..Default::default()
        };
        match build_response(Some(outcome)) {
            Err(ApiError::Internal(message)) => assert_eq!(message, "Unknown analysis error"),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(build_response(None), Err(ApiError::Internal(_))));
    }

    #[test]
    fn success_defaults_message_and_detections() {
        let response = build_response(Some(successful())).unwrap();
        assert!(response.success);
        assert_eq!(response.message, "Analysis successful.");
        assert_eq!(response.detections, Some(Vec::new()));
        assert_eq!(response.heatmap_image_base64, None);
    }

    #[test]
    fn bad_heatmap_is_dropped_not_fatal() {
        let outcome = DetectionOutcome {
            lesion_count: Some(5),
            heatmap_overlay: Some(HeatmapBuffer {
                width: 640,
                height: 640,
                channels: 3,
                pixels: vec![1, 2, 3],
            }),
            ..successful()
        };
        let response = build_response(Some(outcome)).unwrap();
        assert_eq!(response.lesion_count, Some(5));
        assert!(response.heatmap_image_base64.is_none());
    }

    #[test]
    fn extension_comes_from_uploaded_filename() {
        let upload = ImageUpload {
            filename: Some("selfie.final.JPG".into()),
            kind: ImageKind::Jpeg,
            bytes: vec![1],
        };
        assert_eq!(upload.extension(), Some("JPG"));

        let unnamed = ImageUpload {
            filename: None,
            ..upload
        };
        assert_eq!(unnamed.extension(), None);
    }
}
