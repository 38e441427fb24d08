/// Default model for the review request.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Secrets and overrides loaded from the environment variables the CI
/// workflow injects.
///
/// Absence is not validated up front: a missing credential surfaces
/// inside the stage that needs it, which then degrades to its
/// best-effort path instead of aborting the pipeline.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    /// Gemini API key (`GEMINI_API_KEY`, falling back to `GOOGLE_API_KEY`).
    pub gemini_api_key: Option<String>,
    /// Application password for the SMTP submission (`GMAIL_APP_PASSWORD`).
    pub smtp_app_password: Option<String>,
    /// Sender mailbox used for SMTP login and the From header (`SENDER_EMAIL`).
    pub sender_email: Option<String>,
    /// Optional model override (`GEMINI_MODEL`).
    pub gemini_model: Option<String>,
}

impl Secrets {
    /// Load secrets from environment variables.
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .or_else(|| std::env::var("GOOGLE_API_KEY").ok()),
            smtp_app_password: std::env::var("GMAIL_APP_PASSWORD").ok(),
            sender_email: std::env::var("SENDER_EMAIL").ok(),
            gemini_model: std::env::var("GEMINI_MODEL").ok(),
        }
    }

    /// Model to use for the review request.
    pub fn gemini_model(&self) -> String {
        self.gemini_model
            .clone()
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_defaults_when_unset() {
        let secrets = Secrets::default();
        assert_eq!(secrets.gemini_model(), DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn model_override_wins() {
        let secrets = Secrets {
            gemini_model: Some("gemini-2.5-pro".into()),
            ..Secrets::default()
        };
        assert_eq!(secrets.gemini_model(), "gemini-2.5-pro");
    }
}
