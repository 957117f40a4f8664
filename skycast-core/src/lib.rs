//! Core library for the `skycast` weather dashboard.
//!
//! This crate defines:
//! - Synthetic weather generation from coordinates
//! - Location sources and their failure modes
//! - Projection of observations into display strings
//! - The chat relay that answers questions about the displayed weather
//! - Dashboard state driven by discrete events
//!
//! It is used by `skycast-cli`, but can also be reused by other front ends.

pub mod app;
pub mod config;
pub mod location;
pub mod model;
pub mod present;
pub mod relay;
pub mod synth;

pub use app::{AppState, Dashboard, DashboardView, Event};
pub use config::{Config, LocationConfig, RelayConfig};
pub use location::{LocationError, LocationProvider};
pub use model::{Condition, ConditionMain, Coordinate, Landmark, Observation};
pub use present::{CardView, WeatherContext};
pub use relay::{APOLOGY, ChatRelay, RelayError};
pub use synth::WeatherSynth;
