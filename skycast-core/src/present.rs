//! Turning an [`Observation`] into display strings.

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::model::Observation;

/// Shown when neither the category nor the detail has a symbol.
pub const DEFAULT_PICTOGRAM: &str = "🌈";

/// Symbol for a `(main, description)` pair.
///
/// Falls back to the category's default symbol, then to [`DEFAULT_PICTOGRAM`].
pub fn pictogram(main: &str, description: &str) -> &'static str {
    match main {
        "Clear" => "☀️",
        "Clouds" => match description {
            "few clouds" => "🌤️",
            "scattered clouds" => "⛅",
            "broken clouds" | "overcast clouds" => "☁️",
            _ => DEFAULT_PICTOGRAM,
        },
        "Rain" => match description {
            "light rain" => "🌦️",
            "heavy intensity rain" => "⛈️",
            _ => "🌧️",
        },
        "Drizzle" => "🌦️",
        "Thunderstorm" => "⛈️",
        "Snow" => "❄️",
        "Mist" | "Fog" | "Haze" | "Smoke" | "Dust" | "Sand" | "Ash" => "🌫️",
        "Squall" => "💨",
        "Tornado" => "🌪️",
        _ => DEFAULT_PICTOGRAM,
    }
}

/// Long US-English form, e.g. "Sunday, October 18, 2026 at 10:03 PM".
pub fn format_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.format("%A, %B %-d, %Y at %I:%M %p").to_string()
}

/// Rounds halves toward positive infinity (-2.5 becomes -2, 2.5 becomes 3).
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Converts metres per second to whole kilometres per hour.
pub fn wind_kmh(speed_mps: f64) -> i64 {
    round_half_up(speed_mps * 3.6)
}

/// Everything the weather card shows, already formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub location: String,
    pub date: String,
    pub temperature: String,
    pub feels_like: String,
    pub pictogram: String,
    pub wind: String,
    pub humidity: String,
    pub pressure: String,
}

impl CardView {
    pub fn project<Tz>(observation: &Observation, rendered_at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            location: format!("{}, {}", observation.location_name, observation.country_code),
            date: format_timestamp(rendered_at),
            temperature: format!("{}°C", round_half_up(observation.temperature_c)),
            feels_like: format!("Feels like: {}°C", round_half_up(observation.feels_like_c)),
            pictogram: pictogram(
                observation.condition_main().as_str(),
                observation.condition_detail(),
            )
            .to_string(),
            wind: format!("{} km/h", wind_kmh(observation.wind_speed_mps)),
            humidity: format!("{}%", observation.humidity_pct),
            pressure: format!("{} hPa", observation.pressure_hpa),
        }
    }
}

/// Snapshot of the rendered card handed to the chat relay as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherContext {
    pub temperature: String,
    pub location: String,
    pub conditions: String,
    pub wind: String,
    pub humidity: String,
    pub pressure: String,
}

impl WeatherContext {
    /// Context used before any card has been rendered.
    pub fn unknown() -> Self {
        Self {
            temperature: "unknown temperature".to_string(),
            location: "unknown location".to_string(),
            conditions: "unknown conditions".to_string(),
            wind: "unknown".to_string(),
            humidity: "unknown".to_string(),
            pressure: "unknown".to_string(),
        }
    }
}

impl From<&CardView> for WeatherContext {
    fn from(card: &CardView) -> Self {
        Self {
            temperature: card.temperature.clone(),
            location: card.location.clone(),
            conditions: card.pictogram.clone(),
            wind: card.wind.clone(),
            humidity: card.humidity.clone(),
            pressure: card.pressure.clone(),
        }
    }
}
