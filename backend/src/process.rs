//! Runs external collaborator programs that answer with a JSON document on
//! stdout.

use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::process::Command;

use crate::error::CollaboratorError;

/// Exit status a collaborator uses to report that its input does not exist
/// (`EX_NOINPUT` from sysexits.h). Surfaces as `CollaboratorError::NotFound`.
pub const EXIT_NO_INPUT: i32 = 66;

/// Replaces `{name}` placeholders in each argument with the matching path.
pub fn render_args(templates: &[String], substitutions: &[(&str, &Path)]) -> Vec<String> {
    templates
        .iter()
        .map(|template| {
            substitutions
                .iter()
                .fold(template.clone(), |arg, (name, value)| {
                    arg.replace(&format!("{{{}}}", name), &value.to_string_lossy())
                })
        })
        .collect()
}

/// Runs `program` to completion. Empty stdout yields `Ok(None)`; exiting
/// with [`EXIT_NO_INPUT`] yields `NotFound` carrying stderr.
///
/// The child is killed if the returned future is dropped, so an aborted
/// request does not leave model processes behind.
pub async fn run_json<T: DeserializeOwned>(
    program: &str,
    args: &[String],
) -> Result<Option<T>, CollaboratorError> {
    log::debug!("Running collaborator: {} {:?}", program, args);

    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if output.status.code() == Some(EXIT_NO_INPUT) {
            let message = if stderr.is_empty() {
                format!("{} could not find its input", program)
            } else {
                stderr
            };
            return Err(CollaboratorError::NotFound(message));
        }
        return Err(CollaboratorError::Process {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr,
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stdout = stdout.trim();
    if stdout.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(stdout)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn substitutes_every_placeholder() {
        let templates = vec![
            "--model={model}".to_string(),
            "{image}".to_string(),
            "--verbose".to_string(),
        ];
        let args = render_args(
            &templates,
            &[
                ("model", Path::new("/models/best.pt")),
                ("image", Path::new("/tmp/upload-1.jpg")),
            ],
        );
        assert_eq!(args, vec!["--model=/models/best.pt", "/tmp/upload-1.jpg", "--verbose"]);
    }

    #[cfg(unix)]
    #[actix_web::test]
    async fn parses_stdout_json() {
        let args = vec!["-c".to_string(), r#"echo '{"ok": true}'"#.to_string()];
        let value: Option<Value> = run_json("sh", &args).await.unwrap();
        assert_eq!(value, Some(serde_json::json!({"ok": true})));
    }

    #[cfg(unix)]
    #[actix_web::test]
    async fn empty_stdout_is_no_result() {
        let args = vec!["-c".to_string(), "true".to_string()];
        let value: Option<Value> = run_json("sh", &args).await.unwrap();
        assert!(value.is_none());
    }

    #[cfg(unix)]
    #[actix_web::test]
    async fn non_zero_exit_carries_stderr() {
        let args = vec!["-c".to_string(), "echo 'weights missing' >&2; exit 3".to_string()];
        let err = run_json::<Value>("sh", &args).await.unwrap_err();
        match err {
            CollaboratorError::Process { stderr, .. } => assert_eq!(stderr, "weights missing"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[actix_web::test]
    async fn no_input_exit_is_not_found() {
        let args = vec![
            "-c".to_string(),
            "echo 'no such table: readings' >&2; exit 66".to_string(),
        ];
        let err = run_json::<Value>("sh", &args).await.unwrap_err();
        match err {
            CollaboratorError::NotFound(message) => assert_eq!(message, "no such table: readings"),
            other => panic!("unexpected error: {:?}", other),
        }

        let silent = vec!["-c".to_string(), "exit 66".to_string()];
        let err = run_json::<Value>("sh", &silent).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::NotFound(m) if m == "sh could not find its input"));
    }

    #[cfg(unix)]
    #[actix_web::test]
    async fn malformed_stdout_is_a_serialization_error() {
        let args = vec!["-c".to_string(), "echo not-json".to_string()];
        let err = run_json::<Value>("sh", &args).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Serialization(_)));
    }
}
