use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::ErrorResponse;

/// Errors surfaced to HTTP clients. The payload is the client-facing detail.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    UnsupportedMediaType(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    FeatureUnavailable(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("{0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::FeatureUnavailable(_) => StatusCode::NOT_IMPLEMENTED,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Responding {}: {}", status.as_u16(), self);
        } else {
            log::warn!("Responding {}: {}", status.as_u16(), self);
        }
        HttpResponse::build(status).json(ErrorResponse {
            detail: self.to_string(),
        })
    }
}

/// Failures reported by the profile store, correlation and detection engines.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("collaborator is not available")]
    Unavailable,
    #[error("{0}")]
    NotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{program} exited with {status}: {stderr}")]
    Process {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("{0}")]
    InvalidOutput(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn renders_detail_body_with_mapped_status() {
        let err = ApiError::UnsupportedMediaType("Invalid file type 'text/plain'.".into());
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let body = to_bytes(response.into_body()).await.unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.detail, "Invalid file type 'text/plain'.");
    }

    #[test]
    fn taxonomy_maps_to_expected_codes() {
        let cases = [
            (ApiError::BadRequest(String::new()), 400),
            (ApiError::Validation(String::new()), 422),
            (ApiError::NotFound(String::new()), 404),
            (ApiError::FeatureUnavailable(String::new()), 501),
            (ApiError::ServiceUnavailable(String::new()), 503),
            (ApiError::Internal(String::new()), 500),
        ];
        for (err, code) in cases {
            assert_eq!(err.status_code().as_u16(), code);
        }
    }
}
