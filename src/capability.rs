// SPDX-License-Identifier: PMPL-1.0-or-later
//! Generative capability collaborator.
//!
//! The pipeline treats "get a suggestion" and "analyze a page" as a pluggable
//! capability that may be entirely absent (no configured endpoint). Callers
//! hold an `Option<&dyn Capability>` and must have a no-capability path;
//! see the enhancer's rule-based fallback.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AiConfig;
use crate::error::{Error, Result};
use crate::geometry::Rect;

/// One issue candidate reported by the capability's page analysis
#[derive(Debug, Clone, Deserialize)]
pub struct DetectedIssue {
    /// Type label; anything outside the catalogue becomes the catch-all
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub severity: Option<String>,
    pub description: String,
    pub location: Option<Rect>,
    pub wcag_criterion: Option<String>,
    pub confidence: Option<u8>,
    pub recommendation: Option<String>,
}

/// External generative service
#[async_trait]
pub trait Capability: Send + Sync {
    /// Identifier recorded on enhanced issues
    fn service_name(&self) -> &str;

    /// Free-text completion for a remediation prompt
    async fn request(&self, prompt: &str, context: Option<&str>) -> Result<String>;

    /// Visual + textual page analysis returning structured issue candidates
    async fn analyze_page(&self, image: &[u8], text: &str, page: u32)
        -> Result<Vec<DetectedIssue>>;
}

/// HTTP-backed capability speaking the chat-completions shape
pub struct HttpCapability {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    service: String,
    timeout: Duration,
}

const SYSTEM_PROMPT: &str = "You are an expert in document accessibility and WCAG \
compliance. Provide specific, actionable suggestions for accessibility issues.";

impl HttpCapability {
    pub fn new(config: &AiConfig, endpoint: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            service: service_from_endpoint(endpoint),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Probe the endpoint with a minimal request
    pub async fn health_check(&self) -> bool {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user_text("Test")],
            max_tokens: 10,
            temperature: 0.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        matches!(response, Ok(r) if r.status().is_success())
    }

    async fn complete(&self, messages: Vec<ChatMessage>, max_tokens: u32) -> Result<String> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens,
            temperature: 0.3,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(Error::Http)?;

        if !response.status().is_success() {
            return Err(Error::Capability(format!(
                "capability returned status {}",
                response.status()
            )));
        }

        let completion: ChatResponse = response.json().await.map_err(Error::Http)?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Capability("no choices in response".to_string()))
    }
}

#[async_trait]
impl Capability for HttpCapability {
    fn service_name(&self) -> &str {
        &self.service
    }

    async fn request(&self, prompt: &str, context: Option<&str>) -> Result<String> {
        let user = match context {
            Some(ctx) => format!("{}\n\nContext: {}", prompt, ctx),
            None => prompt.to_string(),
        };

        self.complete(
            vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user_text(&user),
            ],
            150,
        )
        .await
    }

    async fn analyze_page(
        &self,
        image: &[u8],
        text: &str,
        page: u32,
    ) -> Result<Vec<DetectedIssue>> {
        let prompt = page_analysis_prompt(page, text);
        let message = if image.is_empty() {
            ChatMessage::user_text(&prompt)
        } else {
            let encoded = base64::engine::general_purpose::STANDARD.encode(image);
            ChatMessage::user_with_image(&prompt, &encoded)
        };

        let content = self.complete(vec![message], 800).await?;
        parse_issue_list(&content)
    }
}

/// Parse the model's reply as a JSON issue list. Replies wrapped in a code
/// fence are unwrapped first.
fn parse_issue_list(content: &str) -> Result<Vec<DetectedIssue>> {
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let parsed: AnalysisReply = serde_json::from_str(trimmed)
        .map_err(|e| Error::Capability(format!("malformed analysis response: {}", e)))?;
    Ok(parsed.issues)
}

fn page_analysis_prompt(page: u32, text: &str) -> String {
    format!(
        "Analyze this document page ({page}) for accessibility issues. Look for:\n\
         1. Images without alt text\n\
         2. Poor color contrast\n\
         3. Unclear heading structure\n\
         4. Inaccessible tables or charts\n\
         5. Form fields without labels\n\
         6. Text that may be hard to read\n\
         7. Any other WCAG violations\n\n\
         Page text:\n{text}\n\n\
         Reply with JSON: {{\"issues\": [{{\"type\", \"severity\", \"description\", \
         \"location\", \"wcag_criterion\", \"confidence\", \"recommendation\"}}]}}"
    )
}

fn service_from_endpoint(endpoint: &str) -> String {
    endpoint
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or("capability")
        .to_string()
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: serde_json::Value,
}

impl ChatMessage {
    fn system(text: &str) -> Self {
        Self {
            role: "system",
            content: serde_json::Value::String(text.to_string()),
        }
    }

    fn user_text(text: &str) -> Self {
        Self {
            role: "user",
            content: serde_json::Value::String(text.to_string()),
        }
    }

    fn user_with_image(text: &str, image_b64: &str) -> Self {
        Self {
            role: "user",
            content: serde_json::json!([
                { "type": "text", "text": text },
                { "type": "image_url",
                  "image_url": { "url": format!("data:image/png;base64,{}", image_b64) } },
            ]),
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    content: String,
}

#[derive(Deserialize)]
struct AnalysisReply {
    #[serde(default)]
    issues: Vec<DetectedIssue>,
}
