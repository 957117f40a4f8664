use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::present::WeatherContext;

use super::{ChatRelay, RelayError, build_prompt, truncate_body};

/// Forwards prompts to a Gemini-style `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiRelay {
    endpoint: String,
    model: String,
    api_key: String,
    http: Client,
}

impl std::fmt::Debug for GeminiRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiRelay")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiRelay {
    pub fn new(endpoint: String, model: String, api_key: String) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            api_key,
            http,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
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
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Pulls `candidates[0].content.parts[0].text` out of a response body.
fn extract_text(body: &str) -> Result<String, RelayError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| RelayError::Malformed(e.to_string()))?;

    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| RelayError::Malformed(truncate_body(body)))
}

#[async_trait]
impl ChatRelay for GeminiRelay {
    async fn reply(&self, context: &WeatherContext, message: &str) -> Result<String, RelayError> {
        let prompt = build_prompt(context, message);
        tracing::debug!(model = %self.model, %prompt, "sending prompt to relay");

        let request = GenerateRequest {
            contents: [Content { parts: [Part { text: &prompt }] }],
        };

        let res = self
            .http
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(RelayError::Status { status, body: truncate_body(&body) });
        }

        let text = extract_text(&body)?;
        tracing::debug!(chars = text.len(), "relay replied");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_endpoint_and_model() {
        let relay = GeminiRelay::new(
            "https://example.test/v1beta/".into(),
            "gemini-2.0-flash".into(),
            "KEY".into(),
        )
        .unwrap();

        assert_eq!(relay.url(), "https://example.test/v1beta/models/gemini-2.0-flash:generateContent");
    }

    #[test]
    fn debug_hides_the_key() {
        let relay = GeminiRelay::new("https://x".into(), "m".into(), "SECRET".into()).unwrap();
        assert!(!format!("{relay:?}").contains("SECRET"));
    }

    #[test]
    fn request_body_has_single_part() {
        let request = GenerateRequest { contents: [Content { parts: [Part { text: "hi" }] }] };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json, serde_json::json!({ "contents": [{ "parts": [{ "text": "hi" }] }] }));
    }

    #[test]
    fn extracts_first_candidate_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Sunny!"},{"text":"x"}]}}]}"#;
        assert_eq!(extract_text(body).unwrap(), "Sunny!");
    }

    #[test]
    fn missing_pieces_are_malformed() {
        for body in [
            r#"{}"#,
            r#"{"candidates":[]}"#,
            r#"{"candidates":[{}]}"#,
            r#"{"candidates":[{"content":{"parts":[]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{}]}}]}"#,
            "not json",
        ] {
            assert!(matches!(extract_text(body), Err(RelayError::Malformed(_))), "{body}");
        }
    }
}
