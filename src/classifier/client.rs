use async_trait::async_trait;
use reqwest::Client;

use crate::domain::Verdict;

use super::{
    protocol::{build_request, parse_verdict, ChatCompletionResponse, OPENROUTER_API_BASE},
    ReplyClassifier,
};

const ATTRIBUTION_REFERER: &str = "https://github.com/hateblock/hateblock";
const ATTRIBUTION_TITLE: &str = "hateblock";

#[derive(Clone)]
pub struct OpenRouterClient {
    http: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenRouterClient {
    pub fn new(http: Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(http, api_key, model, OPENROUTER_API_BASE)
    }

    pub fn with_base_url(
        http: Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
    ) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        }
    }

    /// One attempt, no retries. Pacing between calls belongs to the scan
    /// loop, not the client.
    async fn request_verdict(&self, text: &str) -> Verdict {
        let request = build_request(&self.model, text);
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", ATTRIBUTION_REFERER)
            .header("X-Title", ATTRIBUTION_TITLE)
            .json(&request)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => return Verdict::failure("Request failed", err.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Verdict::failure(
                "API error",
                format!("HTTP {}: {}", status.as_u16(), body),
            );
        }

        match response.json::<ChatCompletionResponse>().await {
            Ok(completion) => parse_verdict(&completion.content()),
            Err(err) => Verdict::failure(
                "Invalid response format",
                format!("could not decode completion envelope: {err}"),
            ),
        }
    }
}

#[async_trait]
impl ReplyClassifier for OpenRouterClient {
    async fn classify(&self, text: &str) -> Verdict {
        let verdict = self.request_verdict(text).await;
        match &verdict.error {
            Some(error) => {
                tracing::warn!(target: "classifier", error = %error, "classification failed");
            }
            None => {
                tracing::debug!(
                    target: "classifier",
                    is_hate = verdict.is_hate,
                    confidence = verdict.confidence,
                    "classification complete"
                );
            }
        }
        verdict
    }
}
