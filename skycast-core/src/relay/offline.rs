use async_trait::async_trait;

use crate::present::WeatherContext;

use super::{ChatRelay, RelayError};

/// Keyword-matched canned answers, used when no credential is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRelay;

impl OfflineRelay {
    pub fn answer(context: &WeatherContext, message: &str) -> String {
        let lower = message.to_lowercase();

        let location = &context.location;
        let temperature = &context.temperature;

        if mentions(&lower, &["hello", "hi"]) {
            "Hello! How can I help you with the weather today?".to_string()
        } else if mentions(&lower, &["temperature"]) {
            format!("The current temperature in {location} is {temperature}.")
        } else if mentions(&lower, &["rain"]) {
            "Based on the current conditions, it doesn't look like rain is in the immediate \
             forecast. Would you like me to check the extended forecast?"
                .to_string()
        } else if mentions(&lower, &["forecast", "tomorrow"]) {
            "I'm currently set up to provide information about current conditions only. \
             In the future, I'll be able to give you detailed forecasts!"
                .to_string()
        } else if mentions(&lower, &["cold", "hot"]) {
            format!(
                "With {temperature}, I would describe the weather as moderate. \
                 Remember to dress appropriately for these conditions!"
            )
        } else if mentions(&lower, &["thank"]) {
            "You're welcome! Feel free to ask if you have any other weather-related questions."
                .to_string()
        } else if mentions(&lower, &["humidity"]) {
            format!("The current humidity in {location} is {}.", context.humidity)
        } else if mentions(&lower, &["wind"]) {
            format!("The current wind speed in {location} is {}.", context.wind)
        } else {
            format!(
                "I'm still learning about weather patterns. In the future, I'll be able to \
                 provide more detailed information about your question regarding \"{message}\"."
            )
        }
    }
}

fn mentions(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(*w))
}

#[async_trait]
impl ChatRelay for OfflineRelay {
    async fn reply(&self, context: &WeatherContext, message: &str) -> Result<String, RelayError> {
        Ok(Self::answer(context, message))
    }
}
