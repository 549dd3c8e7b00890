use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::Verdict;

pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

const SYSTEM_PROMPT: &str = r#"You are a hate speech classifier. Analyze the given text and determine if it contains hate speech, harassment, threats, or toxic content.

Respond ONLY with valid JSON in this exact format:
{"isHate": boolean, "confidence": number, "reason": "brief explanation"}

Where:
- isHate: true if the text contains hate speech, harassment, threats, or toxic content
- confidence: a number from 0-100 indicating your confidence in the classification
- reason: a brief (under 20 words) explanation of your classification"#;

const DEFAULT_REASON: &str = "No reason provided";

// first '{' through last '}', so prose wrapped around the object is tolerated
static JSON_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid json span regex"));

pub fn build_request(model: &str, text: &str) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system".into(),
                content: SYSTEM_PROMPT.into(),
            },
            ChatMessage {
                role: "user".into(),
                content: text.to_string(),
            },
        ],
        temperature: 0.1,
        max_tokens: 150,
    }
}

/// Pull the classification out of the completion text. Models often wrap the
/// JSON in prose or code fences despite the prompt, so everything outside the
/// outermost braces is ignored.
pub fn parse_verdict(content: &str) -> Verdict {
    let Some(span) = JSON_SPAN.find(content) else {
        return Verdict::failure("Invalid response format", "Could not parse JSON from response");
    };

    let parsed: Value = match serde_json::from_str(span.as_str()) {
        Ok(value) => value,
        Err(err) => {
            return Verdict::failure(
                "Invalid response format",
                format!("could not parse classification JSON: {err}"),
            );
        }
    };

    Verdict {
        is_hate: parsed.get("isHate").and_then(Value::as_bool).unwrap_or(false),
        confidence: coerce_confidence(parsed.get("confidence")),
        reason: parsed
            .get("reason")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_REASON)
            .to_string(),
        error: None,
    }
}

fn coerce_confidence(value: Option<&Value>) -> u8 {
    value
        .and_then(Value::as_f64)
        .map(|n| n.clamp(0.0, 100.0).round() as u8)
        .unwrap_or(0)
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

impl ChatCompletionResponse {
    pub fn content(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: Option<ChatCompletionMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionMessage {
    pub content: Option<String>,
}
