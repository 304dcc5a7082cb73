pub mod command;
pub mod heatmap;
pub mod routes;
pub mod staging;

use async_trait::async_trait;
use serde::Deserialize;
use shared::DetectionInfo;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::CollaboratorError;

pub use command::CommandDetectionEngine;

/// What the detection engine reports for one normalized image.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectionOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub severity_score: Option<f64>,
    #[serde(default)]
    pub percentage_area: Option<f64>,
    #[serde(default)]
    pub average_intensity: Option<f64>,
    #[serde(default)]
    pub lesion_count: Option<u32>,
    /// A malformed overlay is logged and dropped rather than failing the
    /// whole document.
    #[serde(default, deserialize_with = "lenient_heatmap::deserialize")]
    pub heatmap_overlay: Option<HeatmapBuffer>,
    #[serde(default)]
    pub detections: Vec<DetectionInfo>,
    #[serde(default)]
    pub model_classes: Option<BTreeMap<u32, String>>,
}

/// Raw overlay pixels, row-major. Three channels are BGR, four are BGRA.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeatmapBuffer {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    #[serde(rename = "data", deserialize_with = "base64_pixels::deserialize")]
    pub pixels: Vec<u8>,
}

mod base64_pixels {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

mod lenient_heatmap {
    use serde::{Deserialize, Deserializer};

    use super::HeatmapBuffer;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<HeatmapBuffer>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(raw.and_then(|value| match HeatmapBuffer::deserialize(value) {
            Ok(buffer) => Some(buffer),
            Err(e) => {
                log::warn!("Ignoring malformed heatmap overlay: {}", e);
                None
            }
        }))
    }
}

#[async_trait]
pub trait DetectionEngine: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    /// Runs the model at `model_path` over the image at `image_path`.
    /// `Ok(None)` means the engine produced no result at all.
    async fn analyze_image(
        &self,
        model_path: &Path,
        image_path: &Path,
    ) -> Result<Option<DetectionOutcome>, CollaboratorError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableDetectionEngine;

#[async_trait]
impl DetectionEngine for UnavailableDetectionEngine {
    fn is_available(&self) -> bool {
        false
    }

    async fn analyze_image(
        &self,
        _model_path: &Path,
        _image_path: &Path,
    ) -> Result<Option<DetectionOutcome>, CollaboratorError> {
        Err(CollaboratorError::Unavailable)
    }
}
