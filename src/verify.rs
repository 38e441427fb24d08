//! Verifier runner stage.
//!
//! Invokes the external `typy` static verifier as a subprocess and folds
//! every failure mode into a plain [`VerificationResult`]: the pipeline
//! never aborts because verification could not run, it reports that
//! outcome in the review email instead.

use async_trait::async_trait;

/// Outcome of the verification stage.
#[derive(Debug, Clone)]
pub struct VerificationResult {
    /// Whether the tool exited with status 0.
    pub succeeded: bool,
    /// Combined stdout + stderr of the tool, or an error description when
    /// the tool could not be run at all.
    pub report: String,
}

/// A source of verification results.
///
/// Infallible by contract: subprocess and spawn failures are folded into
/// the returned result, never raised across the stage boundary.
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Identifier used in log lines.
    fn id(&self) -> &str;

    /// Run the verification.
    async fn verify(&self) -> VerificationResult;
}

/// Runs a verification command as a subprocess.
///
/// Defaults to `typy verify`. Program and arguments are plain fields so
/// tests can substitute a shell command.
pub struct CommandVerifier {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for CommandVerifier {
    fn default() -> Self {
        Self {
            program: "typy".into(),
            args: vec!["verify".into()],
        }
    }
}

#[async_trait]
impl Verifier for CommandVerifier {
    fn id(&self) -> &str {
        &self.program
    }

    async fn verify(&self) -> VerificationResult {
        match tokio::process::Command::new(&self.program)
            .args(&self.args)
            .output()
            .await
        {
            Ok(output) => {
                // stdout first, then stderr, as one human-readable report
                let mut report = String::from_utf8_lossy(&output.stdout).into_owned();
                report.push_str(&String::from_utf8_lossy(&output.stderr));
                VerificationResult {
                    succeeded: output.status.success(),
                    report,
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => VerificationResult {
                succeeded: false,
                report: format!(
                    "Error: the '{}' command was not found. Make sure the verifier is installed on the runner.",
                    self.program
                ),
            },
            Err(e) => VerificationResult {
                succeeded: false,
                report: format!("Unexpected error while running '{}': {e}", self.program),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str) -> CommandVerifier {
        CommandVerifier {
            program: "sh".into(),
            args: vec!["-c".into(), script.into()],
        }
    }

    #[tokio::test]
    async fn exit_zero_succeeds() {
        let result = shell("printf ok").verify().await;
        assert!(result.succeeded);
        assert_eq!(result.report, "ok");
    }

    #[tokio::test]
    async fn non_zero_exit_fails_with_report() {
        let result = shell("printf 'type mismatch' >&2; exit 3").verify().await;
        assert!(!result.succeeded);
        assert!(result.report.contains("type mismatch"));
    }

    #[tokio::test]
    async fn report_concatenates_stdout_before_stderr() {
        let result = shell("printf first; printf second >&2").verify().await;
        let stdout_at = result.report.find("first").unwrap();
        let stderr_at = result.report.find("second").unwrap();
        assert!(stdout_at < stderr_at);
    }

    #[tokio::test]
    async fn missing_program_is_captured_not_fatal() {
        let verifier = CommandVerifier {
            program: "definitely-not-a-real-verifier".into(),
            args: vec![],
        };
        let result = verifier.verify().await;
        assert!(!result.succeeded);
        assert!(result.report.contains("was not found"));
    }

    #[test]
    fn default_runs_typy_verify() {
        let verifier = CommandVerifier::default();
        assert_eq!(verifier.program, "typy");
        assert_eq!(verifier.args, vec!["verify".to_string()]);
    }
}
