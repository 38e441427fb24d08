//! Orchestration driver.
//!
//! Linear hand-off through the four stages:
//!
//! ```text
//! verify ─▸ build prompt ─▸ request review ─▸ notify ─▸ exit code
//! ```
//!
//! The only control decision is the terminal exit code: verification
//! failure exits 1 and blocks the calling CI workflow. AI and SMTP
//! failures are absorbed by their stages and never change it.

use crate::notify::{self, Notifier};
use crate::prompt;
use crate::review::{self, ReviewEngine};
use crate::verify::Verifier;

/// Subject line when verification passed.
const SUBJECT_PASSED: &str = "✅ Automated Code Review - Verification Passed";
/// Subject line when verification failed.
const SUBJECT_FAILED: &str = "❌ Automated Code Review - Verification Failed";

/// Inputs for one pipeline invocation. Built once from the CLI,
/// immutable afterwards.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    /// Committer email address receiving the review.
    pub recipient: String,
    /// Changed file paths, in input order.
    pub changed_files: Vec<String>,
}

impl InvocationContext {
    /// Build the context from the CLI inputs, splitting the file list
    /// on whitespace.
    pub fn new(recipient: String, changed_files: &str) -> Self {
        Self {
            recipient,
            changed_files: changed_files.split_whitespace().map(String::from).collect(),
        }
    }
}

/// The four-stage review pipeline over pluggable stage implementations.
pub struct ReviewPipeline {
    verifier: Box<dyn Verifier>,
    engine: Box<dyn ReviewEngine>,
    notifier: Box<dyn Notifier>,
}

impl ReviewPipeline {
    pub fn new(
        verifier: Box<dyn Verifier>,
        engine: Box<dyn ReviewEngine>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            verifier,
            engine,
            notifier,
        }
    }

    /// Run all stages in sequence and return the process exit code.
    pub async fn run(&self, ctx: &InvocationContext) -> u8 {
        tracing::info!(
            recipient = %ctx.recipient,
            changed_files = ctx.changed_files.len(),
            "Starting review pipeline"
        );

        tracing::info!(verifier = self.verifier.id(), "Running verification");
        let verification = self.verifier.verify().await;
        tracing::info!(succeeded = verification.succeeded, "Verification finished");

        let review_prompt = prompt::build_review_prompt(&ctx.changed_files, &verification.report);

        let subject = if verification.succeeded {
            SUBJECT_PASSED
        } else {
            SUBJECT_FAILED
        };

        tracing::info!(
            engine = self.engine.id(),
            model = self.engine.model_name(),
            "Requesting code review"
        );
        let artifact = review::fetch_review(self.engine.as_ref(), &review_prompt).await;

        notify::deliver(self.notifier.as_ref(), &ctx.recipient, subject, &artifact).await;

        if verification.succeeded {
            tracing::info!("Verification passed, exiting cleanly");
            0
        } else {
            tracing::info!("Verification failed, exiting non-zero to block the push");
            1
        }
    }
}
