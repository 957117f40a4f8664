use skycast_core::{
    DashboardView,
    app::{CardDisplay, ChatMessage, Sender},
};

/// Shown while a fetch is running; `place` is set when the default place was picked.
pub fn loading(place: Option<&str>) -> String {
    match place {
        Some(place) => format!("{place} (Default)\nLoading weather..."),
        None => "Loading weather...".to_string(),
    }
}

/// Plain-text rendering of the weather card, preceded by any notice.
pub fn card(view: &DashboardView) -> String {
    let body = card_body(view);
    match &view.notice {
        Some(notice) => format!("Note: {notice}\n{body}"),
        None => body,
    }
}

fn card_body(view: &DashboardView) -> String {
    match &view.card {
        CardDisplay::Loading => loading(None),
        CardDisplay::Ready(card) => [
            card.location.clone(),
            card.date.clone(),
            String::new(),
            format!("  {}  {}", card.pictogram, card.temperature),
            format!("  {}", card.feels_like),
            String::new(),
            format!("  Wind      {}", card.wind),
            format!("  Humidity  {}", card.humidity),
            format!("  Pressure  {}", card.pressure),
        ]
        .join("\n"),
        CardDisplay::Failed { message, .. } => format!("Error: {message}"),
    }
}

pub fn chat_line(message: &ChatMessage) -> String {
    match message.sender {
        Sender::User => format!("you > {}", message.text),
        Sender::Bot => format!("bot > {}", message.text),
    }
}
