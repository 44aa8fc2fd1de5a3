//! Client for the generative-AI collaborator behind the reflection and chat flows.
//!
//! The app only depends on the [`Assistant`] trait; [`GeminiClient`] talks to the
//! Gemini `generateContent` REST endpoint.

use crate::config::AiConfig;
use crate::models::{AiReflection, ChatRole, ChatTurn, GoalCategory, IncompleteReason};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI credential is not configured; set GEMINI_API_KEY")]
    MissingCredential,

    #[error("AI request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("AI service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AI response contained no text")]
    EmptyResponse,

    #[error("AI response was not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One incomplete goal as it is described to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionItem {
    pub title: String,
    pub category: GoalCategory,
    pub reason: Option<IncompleteReason>,
}

#[async_trait]
pub trait Assistant: Send + Sync {
    async fn reflect(&self, items: &[ReflectionItem]) -> Result<AiReflection, AiError>;

    /// `history` holds earlier turns only; `query` is the new user message.
    async fn chat(&self, history: &[ChatTurn], query: &str) -> Result<String, AiError>;
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: AiConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl Content {
    fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part {
                text: Some(text.into()),
            }],
        }
    }
}

impl GeminiClient {
    pub fn new(config: AiConfig) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn generate(&self, body: Value) -> Result<String, AiError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(AiError::MissingCredential)?;

        debug!(model = %self.config.model, "sending generateContent request");
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GenerateResponse = resp.json().await?;
        extract_text(payload)
    }
}

#[async_trait]
impl Assistant for GeminiClient {
    async fn reflect(&self, items: &[ReflectionItem]) -> Result<AiReflection, AiError> {
        let body = json!({
            "contents": [Content::text("user", reflection_prompt(items))],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": reflection_schema(),
            },
        });
        let text = self.generate(body).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn chat(&self, history: &[ChatTurn], query: &str) -> Result<String, AiError> {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|turn| Content::text(role_name(turn.role), turn.text.clone()))
            .collect();
        contents.push(Content::text("user", query));

        self.generate(json!({ "contents": contents })).await
    }
}

fn role_name(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Model => "model",
    }
}

fn extract_text(payload: GenerateResponse) -> Result<String, AiError> {
    let text: String = payload
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

    if text.trim().is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(text)
}

pub fn reflection_prompt(items: &[ReflectionItem]) -> String {
    let goals: Vec<String> = items
        .iter()
        .map(|item| {
            format!(
                "- Goal: \"{}\", Category: {}, Reason: {}",
                item.title,
                item.category.label(),
                item.reason.map(IncompleteReason::label).unwrap_or("Not specified")
            )
        })
        .collect();

    format!(
        "You are an encouraging coach inside a student's daily goal tracker.\n\
         Some of today's goals were not completed. Using each goal and the reason given, reply with:\n\
         1. motivationalTip: one short, uplifting tip of two or three sentences.\n\
         2. youtubeLinks: two relevant YouTube videos.\n\
         3. articleLinks: two relevant articles or blog posts.\n\n\
         Incomplete goals:\n{}\n\n\
         Answer with JSON only, using real and relevant links.",
        goals.join("\n")
    )
}

fn reflection_schema() -> Value {
    let link_list = |description: &str| {
        json!({
            "type": "ARRAY",
            "description": description,
            "items": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "url": { "type": "STRING" },
                },
            },
        })
    };

    json!({
        "type": "OBJECT",
        "properties": {
            "motivationalTip": {
                "type": "STRING",
                "description": "An uplifting motivational tip for the student.",
            },
            "youtubeLinks": link_list("Relevant YouTube video resources."),
            "articleLinks": link_list("Relevant article or blog post resources."),
        },
    })
}
