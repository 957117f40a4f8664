//! Synthetic weather generation.
//!
//! No real provider is queried: conditions are derived from latitude plus
//! bounded noise from an injected random source.

use rand::Rng;

use crate::model::{Condition, Coordinate, Landmark, Observation};

const BASE_TEMPERATURE_C: f64 = 25.0;
const MAX_LATITUDE_DROP_C: f64 = 30.0;

/// Country tag used for coordinates that match no known place.
pub const WORLD_COUNTRY_CODE: &str = "WL";

/// Temperature before random perturbation: 25°C at the equator, -5°C at the poles.
pub fn baseline_temperature(latitude: f64) -> f64 {
    BASE_TEMPERATURE_C - latitude.abs() / 90.0 * MAX_LATITUDE_DROP_C
}

/// Picks a condition from a temperature band and a uniform draw `r` in `[0, 1)`.
///
/// The odds inside a band are conditional on that band; they are not
/// normalised across bands.
pub fn classify(temperature_c: f64, r: f64) -> Condition {
    if temperature_c > 30.0 {
        Condition::ClearSky
    } else if temperature_c > 20.0 {
        if r < 0.7 { Condition::ClearSky } else { Condition::FewClouds }
    } else if temperature_c > 10.0 {
        if r < 0.4 {
            Condition::ClearSky
        } else if r < 0.7 {
            Condition::ScatteredClouds
        } else {
            Condition::BrokenClouds
        }
    } else if temperature_c > 0.0 {
        if r < 0.3 {
            Condition::OvercastClouds
        } else if r < 0.6 {
            Condition::LightRain
        } else {
            Condition::ModerateRain
        }
    } else if r < 0.5 {
        Condition::LightSnow
    } else {
        Condition::Snow
    }
}

/// Fixed two-decimal text where exact ties round away from zero.
///
/// `{:.2}` alone rounds ties to even, so 0.125 would print as "0.12".
fn two_decimals(value: f64) -> String {
    // Negative zero prints as plain zero.
    let value = if value == 0.0 { 0.0 } else { value };

    // Only multiples of 1/8 with an odd numerator sit exactly between two hundredths.
    let eighths = value.abs() * 8.0;
    if eighths.fract() == 0.0 && eighths % 2.0 == 1.0 {
        let rounded = (value.abs() * 100.0).ceil() / 100.0;
        return format!("{:.2}", rounded.copysign(value));
    }

    format!("{value:.2}")
}

/// Stateless generator; `home` is the one place it recognises by name.
#[derive(Debug, Clone, Default)]
pub struct WeatherSynth {
    home: Landmark,
}

impl WeatherSynth {
    pub fn new(home: Landmark) -> Self {
        Self { home }
    }

    pub fn home(&self) -> &Landmark {
        &self.home
    }

    /// Builds a fresh observation for `coord`. Never fails.
    pub fn generate<R: Rng + ?Sized>(&self, coord: Coordinate, rng: &mut R) -> Observation {
        tracing::debug!(
            latitude = coord.latitude,
            longitude = coord.longitude,
            "generating synthetic weather"
        );

        let temperature_c =
            baseline_temperature(coord.latitude) + (rng.random::<f64>() * 10.0 - 5.0);
        let condition = classify(temperature_c, rng.random::<f64>());

        let (location_name, country_code) = if self.home.is_near(coord) {
            (self.home.name.clone(), self.home.country_code.clone())
        } else {
            (
                format!(
                    "Location ({}, {})",
                    two_decimals(coord.latitude),
                    two_decimals(coord.longitude)
                ),
                WORLD_COUNTRY_CODE.to_string(),
            )
        };

        let feels_like_c = temperature_c - 2.0 + rng.random::<f64>() * 4.0;
        let humidity_pct = (30.0 + rng.random::<f64>() * 70.0).floor() as u8;
        let pressure_hpa = (980.0 + rng.random::<f64>() * 40.0).floor() as u16;
        let wind_speed_mps = 1.0 + rng.random::<f64>() * 9.0;
        let wind_direction_deg = (rng.random::<f64>() * 360.0).floor() as u16;

        Observation {
            location_name,
            country_code,
            temperature_c,
            feels_like_c,
            humidity_pct,
            pressure_hpa,
            condition,
            wind_speed_mps,
            wind_direction_deg,
        }
    }
}
