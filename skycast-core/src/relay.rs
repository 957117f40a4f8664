use crate::{
    Config, RelayConfig,
    present::WeatherContext,
    relay::{gemini::GeminiRelay, offline::OfflineRelay},
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod gemini;
pub mod offline;

/// Shown in the transcript whenever the relay fails.
pub const APOLOGY: &str =
    "I'm having trouble connecting to my knowledge base right now. Please try again later.";

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("relay request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("relay returned status {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },
    #[error("unexpected relay response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait ChatRelay: Send + Sync + Debug {
    async fn reply(&self, context: &WeatherContext, message: &str) -> Result<String, RelayError>;
}

#[async_trait]
impl<T: ChatRelay + ?Sized> ChatRelay for Box<T> {
    async fn reply(&self, context: &WeatherContext, message: &str) -> Result<String, RelayError> {
        (**self).reply(context, message).await
    }
}

/// Prefixes the user's message with the currently displayed weather.
pub fn build_prompt(context: &WeatherContext, message: &str) -> String {
    format!(
        "Based on the current temperature {} in {} with {} conditions, wind speed of {}, \
         humidity of {}, and pressure of {}: {}",
        context.temperature,
        context.location,
        context.conditions,
        context.wind,
        context.humidity,
        context.pressure,
        message,
    )
}

/// Gemini when a credential is available, the canned responder otherwise.
pub fn relay_from_config(config: &Config) -> anyhow::Result<Box<dyn ChatRelay>> {
    relay_with_key(&config.relay, config.relay_api_key())
}

/// Like [`relay_from_config`], with the credential already resolved.
pub fn relay_with_key(
    relay: &RelayConfig,
    api_key: Option<String>,
) -> anyhow::Result<Box<dyn ChatRelay>> {
    let boxed: Box<dyn ChatRelay> = match api_key {
        Some(api_key) => {
            Box::new(GeminiRelay::new(relay.endpoint.clone(), relay.model.clone(), api_key)?)
        }
        None => {
            tracing::warn!(
                "No relay API key configured; answering offline.\n\
                 Hint: run `skycast configure` or set {}.",
                crate::config::API_KEY_ENV
            );
            Box::new(OfflineRelay)
        }
    };

    Ok(boxed)
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> WeatherContext {
        WeatherContext {
            temperature: "31°C".into(),
            location: "New Delhi, IN".into(),
            conditions: "☀️".into(),
            wind: "12 km/h".into(),
            humidity: "40%".into(),
            pressure: "1002 hPa".into(),
        }
    }

    #[test]
    fn prompt_carries_context_then_message() {
        let prompt = build_prompt(&context(), "Should I bring an umbrella?");

        assert_eq!(
            prompt,
            "Based on the current temperature 31°C in New Delhi, IN with ☀️ conditions, \
             wind speed of 12 km/h, humidity of 40%, and pressure of 1002 hPa: \
             Should I bring an umbrella?"
        );
    }

    #[test]
    fn truncate_keeps_short_bodies() {
        assert_eq!(truncate_body("oops"), "oops");

        let long = "é".repeat(300);
        let cut = truncate_body(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
    }

    #[test]
    fn missing_key_answers_offline() {
        let relay = relay_with_key(&RelayConfig::default(), None).unwrap();
        assert!(format!("{relay:?}").contains("OfflineRelay"));
    }

    #[test]
    fn present_key_talks_to_gemini() {
        let relay = relay_with_key(&RelayConfig::default(), Some("KEY".into())).unwrap();
        assert!(format!("{relay:?}").contains("GeminiRelay"));
    }

    #[test]
    fn relay_from_config_with_stored_key_is_gemini() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());

        let relay = relay_from_config(&cfg).unwrap();
        assert!(format!("{relay:?}").contains("GeminiRelay"));
    }
}
