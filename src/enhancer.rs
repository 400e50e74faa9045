use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::GeminiConfig;
use crate::todo::{Priority, TaskDraft};

#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error("no Gemini API key configured")]
    MissingApiKey,
    #[error("request to Gemini failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gemini returned {status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("Gemini returned no text")]
    EmptyResponse,
    #[error("Gemini answer was not a valid enhancement: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEnhancement {
    pub enhanced_title: String,
    pub priority: Priority,
    pub category: String,
}

impl From<TaskEnhancement> for TaskDraft {
    fn from(enhancement: TaskEnhancement) -> Self {
        Self {
            title: enhancement.enhanced_title,
            priority: enhancement.priority,
            category: enhancement.category,
        }
    }
}

pub trait TaskEnhancer: Send + Sync {
    fn enhance(&self, raw: &str) -> Result<TaskEnhancement, EnhanceError>;
}

/// Uses the enhancement when the call succeeds, otherwise the raw text with
/// default priority and category.
pub fn enhance_or_fallback(enhancer: &dyn TaskEnhancer, raw: &str) -> (TaskDraft, bool) {
    match enhancer.enhance(raw) {
        Ok(enhancement) => (enhancement.into(), true),
        Err(err) => {
            warn!(error = %err, "AI analysis failed, using raw input");
            (TaskDraft::fallback(raw), false)
        }
    }
}

pub struct GeminiEnhancer {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiEnhancer {
    pub fn new(config: &GeminiConfig, timeout: Duration) -> Result<Self, EnhanceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: generate_content_url(&config.base_url, &config.model),
            api_key: config.api_key.trim().to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TaskEnhancer for GeminiEnhancer {
    fn enhance(&self, raw: &str) -> Result<TaskEnhancement, EnhanceError> {
        if self.api_key.is_empty() {
            return Err(EnhanceError::MissingApiKey);
        }
        debug!(endpoint = %self.endpoint, "requesting task enhancement");
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&enhancement_request_body(raw))
            .send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(EnhanceError::Api {
                status,
                message: gemini_error_message(&body),
            });
        }
        let text = response_text(&body)?.ok_or(EnhanceError::EmptyResponse)?;
        parse_enhancement(&text)
    }
}

fn generate_content_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/v1beta/models/{}:generateContent",
        base_url.trim().trim_end_matches('/'),
        model.trim()
    )
}

pub fn enhancement_prompt(raw: &str) -> String {
    format!("Improve this task title and categorize it. Task: \"{raw}\"")
}

pub fn enhancement_request_body(raw: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": enhancement_prompt(raw) }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "enhancedTitle": {
                        "type": "STRING",
                        "description": "Better and clearer task title"
                    },
                    "priority": {
                        "type": "STRING",
                        "enum": ["low", "medium", "high"]
                    },
                    "category": {
                        "type": "STRING",
                        "description": "A one-word category (e.g., Work, Health, Home)"
                    }
                },
                "required": ["enhancedTitle", "priority", "category"]
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Text of the first candidate, with its parts joined.
fn response_text(body: &str) -> Result<Option<String>, EnhanceError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|err| EnhanceError::Parse(err.to_string()))?;
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();
    let trimmed = text.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

pub fn parse_enhancement(text: &str) -> Result<TaskEnhancement, EnhanceError> {
    let mut enhancement: TaskEnhancement = serde_json::from_str(text.trim())
        .map_err(|err| EnhanceError::Parse(err.to_string()))?;
    enhancement.enhanced_title = enhancement.enhanced_title.trim().to_string();
    enhancement.category = enhancement.category.trim().to_string();
    if enhancement.enhanced_title.is_empty() {
        return Err(EnhanceError::Parse("enhancedTitle is blank".to_string()));
    }
    if enhancement.category.is_empty() {
        return Err(EnhanceError::Parse("category is blank".to_string()));
    }
    Ok(enhancement)
}

fn gemini_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")?
                .get("message")?
                .as_str()
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
#[path = "../tests/unit/enhancer_tests.rs"]
mod tests;
