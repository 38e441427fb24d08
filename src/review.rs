//! Review requester stage.
//!
//! Sends the assembled prompt to the Gemini generateContent API and
//! post-processes the response into the HTML review artifact. One
//! request per invocation, no retries: an API failure degrades to a
//! minimal HTML error document so the notifier still has something to
//! send.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Request timeout for the generateContent call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ── Review engine trait ──────────────────────────────────────────

/// A backend that turns a review prompt into response text.
#[async_trait]
pub trait ReviewEngine: Send + Sync {
    /// Identifier used in log lines.
    fn id(&self) -> &str;

    /// The model this engine calls.
    fn model_name(&self) -> &str;

    /// Send the prompt and return the raw response text.
    async fn request_review(&self, prompt: &str) -> anyhow::Result<String>;
}

// ── Gemini engine ────────────────────────────────────────────────

/// Review engine backed by the Google Gemini API.
pub struct GeminiEngine {
    /// Gemini API key. `None` when the environment did not provide one;
    /// the request then fails inside this stage like any other API error.
    api_key: Option<String>,
    /// Model to use (e.g. "gemini-2.5-flash", "gemini-2.5-pro").
    model: String,
    /// API endpoint.
    endpoint: String,
    /// HTTP client.
    client: reqwest::Client,
}

impl GeminiEngine {
    /// Create a new Gemini engine for the given model.
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self {
            endpoint: format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                model
            ),
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

/// Response structure from the generateContent endpoint, reduced to
/// the fields this stage reads.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: String,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, if any.
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .next()
            .map(|part| part.text)
            .filter(|text| !text.is_empty())
    }
}

#[async_trait]
impl ReviewEngine for GeminiEngine {
    fn id(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn request_review(&self, prompt: &str) -> anyhow::Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY is not set"))?;

        let payload = serde_json::json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        });

        let url = format!("{}?key={}", self.endpoint, api_key);
        let resp = self
            .client
            .post(&url)
            .json(&payload)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error {}: {}", status, body);
        }

        let body: GenerateContentResponse = resp.json().await?;
        body.first_text()
            .ok_or_else(|| anyhow::anyhow!("Gemini response carried no text part"))
    }
}

// ── Artifact post-processing ─────────────────────────────────────

/// Strip a markdown ```html fence wrapping the document, if present.
///
/// Best effort on the literal opener/closer only; variant fencing
/// (trailing language tags, nested fences) passes through untouched.
pub fn unwrap_html_fence(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.strip_prefix("```html") {
        Some(inner) => {
            let inner = inner.strip_suffix("```").unwrap_or(inner);
            inner.trim().to_string()
        }
        None => trimmed.to_string(),
    }
}

/// Minimal HTML document standing in for the review when the API call
/// failed.
fn fallback_artifact(error: &anyhow::Error) -> String {
    format!("<h1>Gemini API error</h1><p>Could not obtain the code review. Error: {error}</p>")
}

/// Run the review stage: ask the engine, absorb any failure into a
/// fallback document, unwrap the fence.
pub async fn fetch_review(engine: &dyn ReviewEngine, prompt: &str) -> String {
    match engine.request_review(prompt).await {
        Ok(text) => unwrap_html_fence(&text),
        Err(e) => {
            tracing::warn!(
                engine = engine.id(),
                model = engine.model_name(),
                error = %e,
                "Review request failed, falling back to an error artifact"
            );
            fallback_artifact(&e)
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEngine {
        response: anyhow::Result<String>,
    }

    impl FixedEngine {
        fn ok(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
            }
        }

        fn err(message: &str) -> Self {
            Self {
                response: Err(anyhow::anyhow!("{message}")),
            }
        }
    }

    #[async_trait]
    impl ReviewEngine for FixedEngine {
        fn id(&self) -> &str {
            "fixed"
        }

        fn model_name(&self) -> &str {
            "fixed-model"
        }

        async fn request_review(&self, _prompt: &str) -> anyhow::Result<String> {
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    #[test]
    fn unwrap_strips_html_fence() {
        let wrapped = "```html\n<html><body>ok</body></html>\n```";
        assert_eq!(unwrap_html_fence(wrapped), "<html><body>ok</body></html>");
    }

    #[test]
    fn unwrap_strips_unclosed_fence_opener() {
        let wrapped = "```html\n<p>truncated</p>";
        assert_eq!(unwrap_html_fence(wrapped), "<p>truncated</p>");
    }

    #[test]
    fn unwrap_leaves_bare_html_alone() {
        let bare = "<html><body>ok</body></html>";
        assert_eq!(unwrap_html_fence(bare), bare);
    }

    #[test]
    fn unwrap_leaves_other_fences_alone() {
        let other = "```json\n{}\n```";
        assert_eq!(unwrap_html_fence(other), other);
    }

    #[test]
    fn fallback_embeds_the_error() {
        let err = anyhow::anyhow!("connection refused");
        let artifact = fallback_artifact(&err);
        assert!(artifact.starts_with("<h1>"));
        assert!(artifact.contains("connection refused"));
    }

    #[tokio::test]
    async fn fetch_review_unwraps_fenced_response() {
        let engine = FixedEngine::ok("```html\n<p>looks good</p>\n```");
        let artifact = fetch_review(&engine, "prompt").await;
        assert_eq!(artifact, "<p>looks good</p>");
    }

    #[tokio::test]
    async fn fetch_review_absorbs_engine_failure() {
        let engine = FixedEngine::err("quota exceeded");
        let artifact = fetch_review(&engine, "prompt").await;
        assert!(!artifact.is_empty());
        assert!(artifact.contains("Gemini API error"));
        assert!(artifact.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn missing_api_key_fails_inside_the_stage() {
        let engine = GeminiEngine::new(None, "gemini-2.5-flash".into());
        let artifact = fetch_review(&engine, "prompt").await;
        assert!(artifact.contains("GEMINI_API_KEY is not set"));
    }

    #[test]
    fn response_traversal_reads_first_candidate_text() {
        let raw = r#"{
            "candidates": [{
                "content": { "parts": [{ "text": "<html>review</html>" }] }
            }]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.first_text().as_deref(), Some("<html>review</html>"));
    }

    #[test]
    fn response_without_candidates_yields_no_text() {
        let parsed: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.first_text().is_none());
    }

    #[test]
    fn engine_endpoint_names_the_model() {
        let engine = GeminiEngine::new(Some("key".into()), "gemini-2.5-flash".into());
        assert!(engine
            .endpoint
            .ends_with("models/gemini-2.5-flash:generateContent"));
        assert_eq!(engine.model_name(), "gemini-2.5-flash");
    }
}
