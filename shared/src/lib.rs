use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};

pub const DEFAULT_USER_ID: &str = "user_1";
pub const DEFAULT_GENDER: &str = "Not Specified";

fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

fn default_gender() -> Option<String> {
    Some(DEFAULT_GENDER.to_string())
}

/// Demographic profile as submitted by a client.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Profile {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    pub name: String,
    pub dob: NaiveDate,
    pub height: f64,
    pub weight: f64,
    #[serde(default = "default_gender")]
    pub gender: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AnalysisResponse {
    /// Pair name to correlation metrics; the metrics are opaque to the API.
    pub correlations: BTreeMap<String, serde_json::Value>,
    pub summary: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DetectionInfo {
    pub class_name: String,
    pub confidence: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct DetectionResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage_area: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_intensity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesion_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heatmap_image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detections: Option<Vec<DetectionInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_classes: Option<BTreeMap<u32, String>>,
}

/// Image media types accepted by the detection upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
pub enum ImageKind {
    #[strum(serialize = "image/jpeg")]
    Jpeg,
    #[strum(serialize = "image/png")]
    Png,
    #[strum(serialize = "image/bmp")]
    Bmp,
}

impl ImageKind {
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        essence.to_ascii_lowercase().parse().ok()
    }

    pub fn mime(&self) -> &str {
        self.as_ref()
    }
}
