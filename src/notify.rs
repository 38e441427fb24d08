//! Notifier stage: SMTP delivery of the review email.
//!
//! Submission goes over implicit TLS to the provider endpoint,
//! authenticated with the sender address and an application password.
//! Delivery failure never crosses the stage boundary: [`deliver`] logs
//! it and dumps the undelivered HTML to stdout for manual recovery.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

/// Failures surfaced by a notifier.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("{0} is not set in the environment")]
    MissingCredential(&'static str),
    #[error("invalid mailbox address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// A channel that can carry the review email to its recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), NotifyError>;
}

/// Notifier submitting over authenticated SMTP with implicit TLS.
pub struct SmtpNotifier {
    /// Sender mailbox, used both for login and the From header. `None`
    /// when the environment did not provide one.
    sender: Option<String>,
    /// Application password for the sender account.
    app_password: Option<String>,
    /// SMTP host.
    host: String,
    /// Implicit-TLS submission port.
    port: u16,
}

impl SmtpNotifier {
    /// Create a notifier against the default provider endpoint.
    pub fn new(sender: Option<String>, app_password: Option<String>) -> Self {
        Self {
            sender,
            app_password,
            host: "smtp.gmail.com".into(),
            port: 465,
        }
    }
}

/// Build the MIME message: multipart/alternative with one HTML part.
fn build_message(
    sender: &str,
    recipient: &str,
    subject: &str,
    html_body: &str,
) -> Result<Message, NotifyError> {
    let from: Mailbox = sender.parse()?;
    let to: Mailbox = recipient.parse()?;

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .multipart(
            MultiPart::alternative().singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(html_body.to_string()),
            ),
        )?;

    Ok(message)
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), NotifyError> {
        let sender = self
            .sender
            .as_deref()
            .ok_or(NotifyError::MissingCredential("SENDER_EMAIL"))?;
        let app_password = self
            .app_password
            .as_deref()
            .ok_or(NotifyError::MissingCredential("GMAIL_APP_PASSWORD"))?;

        let message = build_message(sender, recipient, subject, html_body)?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)?
            .port(self.port)
            .credentials(Credentials::new(sender.into(), app_password.into()))
            .build();

        mailer.send(message).await?;
        Ok(())
    }
}

/// Send the review, absorbing any failure.
///
/// On success, logs a confirmation naming the recipient. On failure,
/// logs the error and prints the literal HTML body to stdout so the
/// review is not lost. Never affects the pipeline exit code.
pub async fn deliver(notifier: &dyn Notifier, recipient: &str, subject: &str, html_body: &str) {
    match notifier.send(recipient, subject, html_body).await {
        Ok(()) => {
            tracing::info!(recipient, "Review email sent");
        }
        Err(e) => {
            tracing::error!(
                recipient,
                error = %e,
                "Failed to send the review email; check the application password"
            );
            println!("\n--- Undelivered HTML body (for manual recovery) ---\n");
            println!("{html_body}");
            println!("\n----------------------------------------------------\n");
        }
    }
}
