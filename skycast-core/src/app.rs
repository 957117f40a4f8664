//! Dashboard state and the event handler that drives it.
//!
//! Events are processed one at a time to completion, so at most one weather
//! fetch is ever in flight. Rendering is a pure projection of [`AppState`].

use std::time::Duration;

use chrono::{DateTime, Local};
use rand::Rng;
use serde::Serialize;

use crate::{
    location::{LocationError, LocationProvider},
    model::{Coordinate, Landmark, Observation},
    present::{CardView, WeatherContext},
    relay::{APOLOGY, ChatRelay},
    synth::WeatherSynth,
};

/// Delay before each generation unless a front end picks another.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(1500);

/// The last successfully generated observation and when it was rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentObservation {
    pub observation: Observation,
    pub rendered_at: DateTime<Local>,
}

/// What the card is doing. The observation itself lives in [`AppState::current`].
#[derive(Debug, Clone, PartialEq)]
pub enum CardState {
    Loading,
    Ready,
    Failed {
        message: String,
        can_retry: bool,
        can_use_default: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    pub open: bool,
    pub typing: bool,
    pub transcript: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub card: CardState,
    /// Overwritten only by a successful generation; failures leave it alone.
    pub current: Option<CurrentObservation>,
    /// Informational message shown above the card, e.g. an automatic fallback.
    pub notice: Option<String>,
    pub chat: ChatState,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            card: CardState::Loading,
            current: None,
            notice: None,
            chat: ChatState::default(),
        }
    }
}

/// Everything a front end can do to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Initial load: ask the location provider.
    LoadRequested,
    RetryLocation,
    UseDefaultLocation,
    ToggleChat,
    SendMessage(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum CardDisplay {
    Loading,
    Ready(CardView),
    Failed { message: String, can_retry: bool, can_use_default: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub card: CardDisplay,
    pub notice: Option<String>,
    pub chat_open: bool,
    pub typing: bool,
    pub transcript: Vec<ChatMessage>,
}

impl AppState {
    /// The last rendered card, kept even while a later fetch is failing.
    pub fn card_view(&self) -> Option<CardView> {
        self.current
            .as_ref()
            .map(|current| CardView::project(&current.observation, &current.rendered_at))
    }

    /// Context for the relay, taken from the last rendered card.
    pub fn weather_context(&self) -> WeatherContext {
        self.card_view()
            .map(|card| WeatherContext::from(&card))
            .unwrap_or_else(WeatherContext::unknown)
    }

    pub fn view(&self) -> DashboardView {
        let card = match (&self.card, self.card_view()) {
            (CardState::Ready, Some(card)) => CardDisplay::Ready(card),
            (CardState::Ready | CardState::Loading, _) => CardDisplay::Loading,
            (CardState::Failed { message, can_retry, can_use_default }, _) => {
                CardDisplay::Failed {
                    message: message.clone(),
                    can_retry: *can_retry,
                    can_use_default: *can_use_default,
                }
            }
        };

        DashboardView {
            card,
            notice: self.notice.clone(),
            chat_open: self.chat.open,
            typing: self.chat.typing,
            transcript: self.chat.transcript.clone(),
        }
    }
}

/// Owns the state and its collaborators.
#[derive(Debug)]
pub struct Dashboard<L, R, G> {
    state: AppState,
    locator: L,
    relay: R,
    rng: G,
    synth: WeatherSynth,
    latency: Duration,
}

impl<L, R, G> Dashboard<L, R, G>
where
    L: LocationProvider,
    R: ChatRelay,
    G: Rng,
{
    pub fn new(locator: L, relay: R, rng: G, synth: WeatherSynth) -> Self {
        Self {
            state: AppState::default(),
            locator,
            relay,
            rng,
            synth,
            latency: DEFAULT_LATENCY,
        }
    }

    /// Delay inserted before each generation to mimic a network round trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The place used by [`Event::UseDefaultLocation`].
    pub fn home(&self) -> &Landmark {
        self.synth.home()
    }

    pub fn view(&self) -> DashboardView {
        self.state.view()
    }

    pub async fn dispatch(&mut self, event: Event) {
        tracing::debug!(?event, "dispatching");

        match event {
            Event::LoadRequested | Event::RetryLocation => {
                self.state.notice = None;
                self.load_from_locator().await;
            }
            Event::UseDefaultLocation => {
                self.state.notice = None;
                self.load_default().await;
            }
            Event::ToggleChat => self.state.chat.open = !self.state.chat.open,
            Event::SendMessage(text) => self.send_message(&text).await,
        }
    }

    async fn load_from_locator(&mut self) {
        self.state.card = CardState::Loading;

        match self.locator.locate().await {
            Ok(coord) => self.fetch_weather(coord).await,
            Err(err @ LocationError::Unsupported) => {
                tracing::warn!("location lookup unsupported, using default location");
                self.state.notice = Some(err.user_message());
                self.load_default().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "location lookup failed");
                self.state.card = CardState::Failed {
                    message: err.user_message(),
                    can_retry: true,
                    can_use_default: true,
                };
            }
        }
    }

    async fn load_default(&mut self) {
        let home = self.synth.home();
        tracing::info!(place = %home.label, "using default location");

        let coord = home.coordinate();
        self.state.card = CardState::Loading;
        self.fetch_weather(coord).await;
    }

    async fn fetch_weather(&mut self, coord: Coordinate) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let observation = self.synth.generate(coord, &mut self.rng);
        tracing::info!(
            location = %observation.location_name,
            temperature_c = observation.temperature_c,
            condition = observation.condition_detail(),
            "weather updated"
        );

        self.state.current = Some(CurrentObservation { observation, rendered_at: Local::now() });
        self.state.card = CardState::Ready;
    }

    async fn send_message(&mut self, text: &str) {
        let message = text.trim();
        if message.is_empty() {
            return;
        }

        self.state.chat.transcript.push(ChatMessage {
            sender: Sender::User,
            text: message.to_string(),
        });
        self.state.chat.typing = true;

        let context = self.state.weather_context();
        let reply = match self.relay.reply(&context, message).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!(error = %err, "chat relay failed");
                APOLOGY.to_string()
            }
        };

        self.state.chat.typing = false;
        self.state.chat.transcript.push(ChatMessage { sender: Sender::Bot, text: reply });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        location::{DisabledLocator, FixedLocation, UnsupportedLocator},
        relay::{RelayError, offline::OfflineRelay},
    };
    use async_trait::async_trait;
    use rand::{SeedableRng, rngs::StdRng};
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    };

    /// Records the context it was given and answers with a fixed outcome.
    #[derive(Debug, Default)]
    struct RecordingRelay {
        fail: bool,
        seen: Mutex<Vec<(WeatherContext, String)>>,
    }

    #[async_trait]
    impl ChatRelay for RecordingRelay {
        async fn reply(
            &self,
            context: &WeatherContext,
            message: &str,
        ) -> Result<String, RelayError> {
            self.seen.lock().unwrap().push((context.clone(), message.to_string()));
            if self.fail {
                Err(RelayError::Malformed("nope".into()))
            } else {
                Ok(format!("echo: {message}"))
            }
        }
    }

    /// Finds the coordinate once, then times out on every later lookup.
    #[derive(Debug)]
    struct FlakyLocator {
        coord: Coordinate,
        used: AtomicBool,
    }

    impl FlakyLocator {
        fn new(coord: Coordinate) -> Self {
            Self { coord, used: AtomicBool::new(false) }
        }
    }

    #[async_trait]
    impl LocationProvider for FlakyLocator {
        async fn locate(&self) -> Result<Coordinate, LocationError> {
            if self.used.swap(true, Ordering::SeqCst) {
                Err(LocationError::Timeout)
            } else {
                Ok(self.coord)
            }
        }
    }

    fn dashboard<L: LocationProvider, R: ChatRelay>(locator: L, relay: R) -> Dashboard<L, R, StdRng> {
        Dashboard::new(locator, relay, StdRng::seed_from_u64(5), WeatherSynth::default())
            .with_latency(Duration::ZERO)
    }

    fn observation<L, R, G>(app: &Dashboard<L, R, G>) -> &Observation {
        &app.state.current.as_ref().expect("an observation should be rendered").observation
    }

    #[tokio::test]
    async fn load_renders_observation_for_located_coordinate() {
        let mut app = dashboard(FixedLocation(Coordinate::new(0.0, 0.0)), OfflineRelay);

        app.dispatch(Event::LoadRequested).await;

        assert_eq!(app.state().card, CardState::Ready);
        assert_eq!(observation(&app).country_code, "WL");
    }

    #[tokio::test]
    async fn denied_location_offers_retry_and_default() {
        let mut app = dashboard(DisabledLocator, OfflineRelay);

        app.dispatch(Event::LoadRequested).await;

        assert_eq!(
            app.state().card,
            CardState::Failed {
                message: "Unable to get your location. Location access was denied.".into(),
                can_retry: true,
                can_use_default: true,
            }
        );
        assert!(app.state().notice.is_none());
    }

    #[tokio::test]
    async fn default_location_recovers_from_failure() {
        let mut app = dashboard(DisabledLocator, OfflineRelay);

        app.dispatch(Event::LoadRequested).await;
        app.dispatch(Event::UseDefaultLocation).await;

        let card = app.state().card_view().expect("card should be ready");
        assert_eq!(card.location, "New Delhi, IN");
        assert_eq!(app.home().label, "New Delhi, India");
    }

    #[tokio::test]
    async fn unsupported_lookup_falls_back_automatically() {
        let mut app = dashboard(UnsupportedLocator, OfflineRelay);

        app.dispatch(Event::LoadRequested).await;

        let card = app.state().card_view().expect("card should be ready");
        assert_eq!(card.location, "New Delhi, IN");
        assert_eq!(
            app.view().notice.as_deref(),
            Some("Location lookup is not supported here. Using default location.")
        );
    }

    #[tokio::test]
    async fn notice_is_cleared_by_the_next_load() {
        let mut app = dashboard(UnsupportedLocator, OfflineRelay);

        app.dispatch(Event::LoadRequested).await;
        app.dispatch(Event::UseDefaultLocation).await;

        assert!(app.view().notice.is_none());
    }

    #[tokio::test]
    async fn retry_replaces_the_observation() {
        let mut app = dashboard(FixedLocation(Coordinate::new(10.0, 10.0)), OfflineRelay);

        app.dispatch(Event::LoadRequested).await;
        let first = observation(&app).clone();
        app.dispatch(Event::RetryLocation).await;

        assert_eq!(app.state().card, CardState::Ready);
        assert_ne!(observation(&app), &first);
    }

    #[tokio::test]
    async fn failed_retry_keeps_the_last_card_as_context() {
        let mut app =
            dashboard(FlakyLocator::new(Coordinate::new(48.85, 2.35)), RecordingRelay::default());

        app.dispatch(Event::LoadRequested).await;
        let card = app.state().card_view().expect("first lookup should render");
        app.dispatch(Event::RetryLocation).await;
        assert!(matches!(app.view().card, CardDisplay::Failed { .. }));

        app.dispatch(Event::SendMessage("still raining?".into())).await;

        let seen = app.relay.seen.lock().unwrap();
        assert_eq!(seen[0].0, WeatherContext::from(&card));
        assert_ne!(seen[0].0, WeatherContext::unknown());
    }

    #[tokio::test]
    async fn chat_toggles() {
        let mut app = dashboard(DisabledLocator, OfflineRelay);

        app.dispatch(Event::ToggleChat).await;
        assert!(app.view().chat_open);
        app.dispatch(Event::ToggleChat).await;
        assert!(!app.view().chat_open);
    }

    #[tokio::test]
    async fn messages_carry_rendered_card_as_context() {
        let mut app = dashboard(
            FixedLocation(Coordinate::new(28.6, 77.2)),
            RecordingRelay::default(),
        );
        app.dispatch(Event::LoadRequested).await;
        let card = app.state().card_view().unwrap();

        app.dispatch(Event::SendMessage("  is it windy?  ".into())).await;

        let seen = app.relay.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, WeatherContext::from(&card));
        assert_eq!(seen[0].1, "is it windy?");
        drop(seen);

        let transcript = &app.state().chat.transcript;
        assert_eq!(transcript[0], ChatMessage { sender: Sender::User, text: "is it windy?".into() });
        assert_eq!(transcript[1].text, "echo: is it windy?");
        assert!(!app.state().chat.typing);
    }

    #[tokio::test]
    async fn context_is_unknown_before_first_render() {
        let mut app = dashboard(DisabledLocator, RecordingRelay::default());

        app.dispatch(Event::SendMessage("hello".into())).await;

        let seen = app.relay.seen.lock().unwrap();
        assert_eq!(seen[0].0, WeatherContext::unknown());
    }

    #[tokio::test]
    async fn blank_messages_are_ignored() {
        let mut app = dashboard(DisabledLocator, RecordingRelay::default());

        app.dispatch(Event::SendMessage("   ".into())).await;

        assert!(app.state().chat.transcript.is_empty());
        assert!(app.relay.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn relay_failure_apologises_without_touching_the_card() {
        let mut app = dashboard(
            FixedLocation(Coordinate::new(40.0, -3.7)),
            RecordingRelay { fail: true, ..Default::default() },
        );
        app.dispatch(Event::LoadRequested).await;
        let before = app.view().card;

        app.dispatch(Event::SendMessage("what now?".into())).await;

        assert_eq!(app.view().card, before);
        let last = app.state().chat.transcript.last().unwrap();
        assert_eq!(last, &ChatMessage { sender: Sender::Bot, text: APOLOGY.into() });
    }

    #[tokio::test]
    async fn view_is_a_projection_of_state() {
        let mut app = dashboard(FixedLocation(Coordinate::new(-80.0, 0.0)), OfflineRelay);
        app.dispatch(Event::LoadRequested).await;

        let view = app.view();
        assert_eq!(view, app.view());
        match view.card {
            CardDisplay::Ready(card) => assert_eq!(card.location, "Location (-80.00, 0.00), WL"),
            other => panic!("expected ready card, got {other:?}"),
        }
    }

    #[test]
    fn new_dashboards_wait_like_a_network_call() {
        let app = Dashboard::new(
            DisabledLocator,
            OfflineRelay,
            StdRng::seed_from_u64(1),
            WeatherSynth::default(),
        );
        assert_eq!(app.latency, Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn latency_is_waited_out_before_rendering() {
        let mut app = Dashboard::new(
            FixedLocation(Coordinate::new(1.0, 1.0)),
            OfflineRelay,
            StdRng::seed_from_u64(5),
            WeatherSynth::default(),
        );

        let started = tokio::time::Instant::now();
        app.dispatch(Event::LoadRequested).await;

        assert!(started.elapsed() >= DEFAULT_LATENCY);
        assert_eq!(app.state().card, CardState::Ready);
    }
}
