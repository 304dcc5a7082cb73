use async_trait::async_trait;
use shared::AnalysisResponse;
use std::path::Path;

use super::{CorrelationEngine, Correlations};
use crate::error::CollaboratorError;
use crate::process::{render_args, run_json};

/// Correlation analysis delegated to an external program.
///
/// The program receives the data source through the `{data_source}`
/// placeholder and prints `{"correlations": {...}, "summary": "..."}`.
/// Exiting with status 66 reports a missing input, answered as 404.
#[derive(Debug, Clone)]
pub struct CommandCorrelationEngine {
    program: String,
    args: Vec<String>,
}

impl CommandCorrelationEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl CorrelationEngine for CommandCorrelationEngine {
    async fn analyze(
        &self,
        data_source: &Path,
    ) -> Result<(Correlations, String), CollaboratorError> {
        let args = render_args(&self.args, &[("data_source", data_source)]);
        let response: AnalysisResponse = run_json(&self.program, &args)
            .await?
            .ok_or_else(|| {
                CollaboratorError::InvalidOutput(format!("{} produced no output", self.program))
            })?;
        Ok((response.correlations, response.summary))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn passes_data_source_and_parses_result() {
        let engine = CommandCorrelationEngine::new(
            "sh",
            vec![
                "-c".to_string(),
                r#"printf '{"correlations": {"sleep_vs_severity": {"r": -0.42}}, "summary": "%s"}' "$0""#
                    .to_string(),
                "{data_source}".to_string(),
            ],
        );

        let (correlations, summary) = engine
            .analyze(Path::new("/data/acne_tracker.db"))
            .await
            .unwrap();

        assert_eq!(summary, "/data/acne_tracker.db");
        assert_eq!(correlations["sleep_vs_severity"]["r"], -0.42);
    }

    #[actix_web::test]
    async fn missing_input_exit_is_not_found() {
        let engine = CommandCorrelationEngine::new(
            "sh",
            vec![
                "-c".to_string(),
                "echo 'no such table: daily_log' >&2; exit 66".to_string(),
            ],
        );
        let err = engine.analyze(Path::new("db")).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::NotFound(m) if m == "no such table: daily_log"));
    }

    #[actix_web::test]
    async fn empty_output_is_invalid() {
        let engine = CommandCorrelationEngine::new("sh", vec!["-c".into(), "true".into()]);
        let err = engine.analyze(Path::new("db")).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::InvalidOutput(_)));
    }
}
