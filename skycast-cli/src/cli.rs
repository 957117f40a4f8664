use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, CustomType, InquireError, Password, PasswordDisplayMode, Select, Text};
use rand::{SeedableRng, rngs::StdRng};
use skycast_core::{
    ChatRelay, Config, Coordinate, Dashboard, Event, LocationProvider, WeatherSynth,
    app::{CardDisplay, Sender},
    location::{FixedLocation, locator_from_config},
    relay::relay_from_config,
};
use std::time::Duration;

use crate::render;

type App = Dashboard<Box<dyn LocationProvider>, Box<dyn ChatRelay>, StdRng>;

const RETRY: &str = "Retry with Location";
const USE_DEFAULT: &str = "Use Default Location";
const QUIT: &str = "Quit";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Weather dashboard with a chat assistant")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the chat credential and location preferences.
    Configure,

    /// Print the weather card once and exit.
    Show {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the card as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the card and chat about it.
    Dashboard {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Print where the config file lives.
    ConfigPath,
}

/// Where the coordinates come from and how the weather is generated.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Latitude in decimal degrees; requires --lon.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude in decimal degrees; requires --lat.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Skip the location lookup and use the configured default place.
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub default: bool,

    /// Seed for reproducible weather.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Skip the simulated network delay.
    #[arg(long)]
    pub no_delay: bool,
}

impl SourceArgs {
    fn coordinate(&self) -> Option<Coordinate> {
        self.lat.zip(self.lon).map(|(lat, lon)| Coordinate::new(lat, lon))
    }

    fn initial_event(&self) -> Event {
        if self.default { Event::UseDefaultLocation } else { Event::LoadRequested }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure()?,
            Command::Show { source, json } => {
                let config = Config::load()?;
                let mut app = build_dashboard(&config, &source)?;

                app.dispatch(source.initial_event()).await;

                let view = app.view();
                if json {
                    println!("{}", serde_json::to_string_pretty(&view)?);
                } else {
                    println!("{}", render::card(&view));
                }
            }
            Command::Dashboard { source } => {
                let config = Config::load()?;
                let app = build_dashboard(&config, &source)?;
                interactive(app, source.initial_event()).await?;
            }
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
            }
        }

        Ok(())
    }
}

fn build_dashboard(config: &Config, source: &SourceArgs) -> Result<App> {
    tracing::debug!(?source, "building dashboard");

    let locator: Box<dyn LocationProvider> = match source.coordinate() {
        Some(coord) => Box::new(FixedLocation(coord)),
        None => locator_from_config(&config.location)?,
    };
    let relay = relay_from_config(config)?;
    let synth = WeatherSynth::new(config.location.default.clone());

    let latency = if source.no_delay { Duration::ZERO } else { config.simulated_latency() };
    Ok(Dashboard::new(locator, relay, source.rng(), synth).with_latency(latency))
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("Gemini API key (leave empty for offline answers):")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()?;
    config.set_api_key(api_key);

    config.location.geolocation = Confirm::new("Look up your location automatically?")
        .with_default(config.location.geolocation)
        .prompt()?;

    config.simulated_latency_ms = CustomType::<u64>::new("Simulated network delay (ms):")
        .with_default(config.simulated_latency_ms)
        .prompt()?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

fn is_exit(err: &InquireError) -> bool {
    matches!(err, InquireError::OperationCanceled | InquireError::OperationInterrupted)
}

async fn load(app: &mut App, event: Event) {
    let place = (event == Event::UseDefaultLocation).then(|| app.home().label.clone());
    println!("{}", render::loading(place.as_deref()));
    app.dispatch(event).await;
    println!("{}\n", render::card(&app.view()));
}

async fn interactive(mut app: App, first: Event) -> Result<()> {
    load(&mut app, first).await;
    app.dispatch(Event::ToggleChat).await;

    loop {
        if let CardDisplay::Failed { can_retry, can_use_default, .. } = app.view().card {
            let mut options = Vec::new();
            if can_retry {
                options.push(RETRY);
            }
            if can_use_default {
                options.push(USE_DEFAULT);
            }
            options.push(QUIT);

            let choice = match Select::new("What next?", options).prompt() {
                Ok(choice) => choice,
                Err(e) if is_exit(&e) => break,
                Err(e) => return Err(e.into()),
            };

            let event = match choice {
                RETRY => Event::RetryLocation,
                USE_DEFAULT => Event::UseDefaultLocation,
                _ => break,
            };
            load(&mut app, event).await;
            continue;
        }

        let input = match Text::new("you >")
            .with_help_message("ask about the weather, or /retry, /default, /card, /quit")
            .prompt()
        {
            Ok(input) => input,
            Err(e) if is_exit(&e) => break,
            Err(e) => return Err(e.into()),
        };

        match input.trim() {
            "/quit" | "/exit" => break,
            "/card" => println!("{}\n", render::card(&app.view())),
            "/retry" => load(&mut app, Event::RetryLocation).await,
            "/default" => load(&mut app, Event::UseDefaultLocation).await,
            _ => {
                let seen = app.state().chat.transcript.len();
                app.dispatch(Event::SendMessage(input)).await;

                for message in &app.state().chat.transcript[seen..] {
                    if message.sender == Sender::Bot {
                        println!("{}\n", render::chat_line(message));
                    }
                }
            }
        }
    }

    Ok(())
}
