//! reviewgate: CI code-review notifier.
//!
//! Single-shot batch job run once per CI trigger. Runs the `typy`
//! static verifier, asks Gemini for an HTML review of the changed
//! files, emails the review to the committer, and exits non-zero when
//! verification failed so the calling workflow blocks the push.
//!
//! Everything except a missing CLI argument degrades gracefully: a
//! broken verifier, a failed API call, or an undeliverable email never
//! abort the pipeline. The exit code reflects the verifier result only.

mod config;
mod notify;
mod pipeline;
mod prompt;
mod review;
mod verify;

use clap::Parser;
use std::process::ExitCode;

use config::Secrets;
use notify::SmtpNotifier;
use pipeline::{InvocationContext, ReviewPipeline};
use review::GeminiEngine;
use verify::CommandVerifier;

/// Run the verifier, email an AI code review, and gate the CI workflow.
#[derive(Debug, Parser)]
#[command(name = "reviewgate", version, about)]
struct Cli {
    /// Email address of the committer who receives the review.
    recipient: String,

    /// Whitespace-separated list of changed file paths.
    changed_files: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // The gate contract is exit code 1 for missing inputs; clap's
    // default error code is 2, so parse manually and remap. Help and
    // version output still exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(if err.use_stderr() { 1 } else { 0 });
        }
    };

    let ctx = InvocationContext::new(cli.recipient, &cli.changed_files);
    let secrets = Secrets::from_env();

    let pipeline = ReviewPipeline::new(
        Box::new(CommandVerifier::default()),
        Box::new(GeminiEngine::new(
            secrets.gemini_api_key.clone(),
            secrets.gemini_model(),
        )),
        Box::new(SmtpNotifier::new(
            secrets.sender_email.clone(),
            secrets.smtp_app_password.clone(),
        )),
    );

    ExitCode::from(pipeline.run(&ctx).await)
}
