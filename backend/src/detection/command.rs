use async_trait::async_trait;
use std::path::Path;

use super::{DetectionEngine, DetectionOutcome};
use crate::error::CollaboratorError;
use crate::process::{render_args, run_json};

/// Detection delegated to an external program, typically the model's own
/// inference script. Arguments may reference `{model}` and `{image}`.
#[derive(Debug, Clone)]
pub struct CommandDetectionEngine {
    program: String,
    args: Vec<String>,
}

impl CommandDetectionEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl DetectionEngine for CommandDetectionEngine {
    async fn analyze_image(
        &self,
        model_path: &Path,
        image_path: &Path,
    ) -> Result<Option<DetectionOutcome>, CollaboratorError> {
        let args = render_args(&self.args, &[("model", model_path), ("image", image_path)]);
        run_json(&self.program, &args).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn forwards_model_and_image_paths() {
        let engine = CommandDetectionEngine::new(
            "sh",
            vec![
                "-c".to_string(),
                r#"printf '{"success": true, "message": "%s %s"}' "$0" "$1""#.to_string(),
                "{model}".to_string(),
                "{image}".to_string(),
            ],
        );

        let outcome = engine
            .analyze_image(Path::new("/w/best.pt"), Path::new("/tmp/upload.png"))
            .await
            .unwrap()
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.message.as_deref(), Some("/w/best.pt /tmp/upload.png"));
    }

    #[actix_web::test]
    async fn undecodable_heatmap_does_not_fail_detection() {
        let engine = CommandDetectionEngine::new(
            "sh",
            vec![
                "-c".to_string(),
                r#"echo '{"success": true, "lesion_count": 3, "heatmap_overlay": {"width": 1, "height": 1, "channels": 3, "data": "not base64!!"}}'"#
                    .to_string(),
            ],
        );

        let outcome = engine
            .analyze_image(Path::new("/w/best.pt"), Path::new("/tmp/upload.png"))
            .await
            .unwrap()
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.lesion_count, Some(3));
        assert!(outcome.heatmap_overlay.is_none());
    }
}
