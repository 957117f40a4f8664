use serde::{Deserialize, Serialize};

/// A point on the globe in decimal degrees.
///
/// Values are not validated; out-of-range input is passed through as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Coarse weather category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionMain {
    Clear,
    Clouds,
    Rain,
    Snow,
}

impl ConditionMain {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionMain::Clear => "Clear",
            ConditionMain::Clouds => "Clouds",
            ConditionMain::Rain => "Rain",
            ConditionMain::Snow => "Snow",
        }
    }
}

impl std::fmt::Display for ConditionMain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detailed condition. Each variant belongs to exactly one [`ConditionMain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    ClearSky,
    FewClouds,
    ScatteredClouds,
    BrokenClouds,
    OvercastClouds,
    LightRain,
    ModerateRain,
    LightSnow,
    Snow,
}

impl Condition {
    pub const fn all() -> &'static [Condition] {
        &[
            Condition::ClearSky,
            Condition::FewClouds,
            Condition::ScatteredClouds,
            Condition::BrokenClouds,
            Condition::OvercastClouds,
            Condition::LightRain,
            Condition::ModerateRain,
            Condition::LightSnow,
            Condition::Snow,
        ]
    }

    pub fn main(&self) -> ConditionMain {
        match self {
            Condition::ClearSky => ConditionMain::Clear,
            Condition::FewClouds
            | Condition::ScatteredClouds
            | Condition::BrokenClouds
            | Condition::OvercastClouds => ConditionMain::Clouds,
            Condition::LightRain | Condition::ModerateRain => ConditionMain::Rain,
            Condition::LightSnow | Condition::Snow => ConditionMain::Snow,
        }
    }

    /// Lower-case qualifier, e.g. "light rain".
    pub fn description(&self) -> &'static str {
        match self {
            Condition::ClearSky => "clear sky",
            Condition::FewClouds => "few clouds",
            Condition::ScatteredClouds => "scattered clouds",
            Condition::BrokenClouds => "broken clouds",
            Condition::OvercastClouds => "overcast clouds",
            Condition::LightRain => "light rain",
            Condition::ModerateRain => "moderate rain",
            Condition::LightSnow => "light snow",
            Condition::Snow => "snow",
        }
    }
}

/// One synthesized weather reading. Built fresh per generation and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub location_name: String,
    pub country_code: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u16,
    pub condition: Condition,
    pub wind_speed_mps: f64,
    pub wind_direction_deg: u16,
}

impl Observation {
    pub fn condition_main(&self) -> ConditionMain {
        self.condition.main()
    }

    pub fn condition_detail(&self) -> &'static str {
        self.condition.description()
    }
}

/// The configured default place: recognised by the generator and used as the
/// manual fallback when device location is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub name: String,
    pub country_code: String,
    /// Label shown while the fallback location is loading, e.g. "New Delhi, India".
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Landmark {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// True when `coord` lies strictly within one degree on both axes.
    pub fn is_near(&self, coord: Coordinate) -> bool {
        (coord.latitude - self.latitude).abs() < 1.0
            && (coord.longitude - self.longitude).abs() < 1.0
    }
}

impl Default for Landmark {
    fn default() -> Self {
        Self {
            name: "New Delhi".to_string(),
            country_code: "IN".to_string(),
            label: "New Delhi, India".to_string(),
            latitude: 28.6139,
            longitude: 77.2090,
        }
    }
}
