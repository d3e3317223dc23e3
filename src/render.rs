//! Plain-text rendering of the page state for the terminal

use std::fmt::Write;

use crate::models::{IcebreakerCard, Receipt};
use crate::state::AppState;

/// `Using: lat 59.3293, lon 18.0686 (fallback) | Error: ...`
#[must_use]
pub fn location_line(state: &AppState) -> String {
    let (lat, lon) = match state.coordinate {
        Some(c) => (format!("{:.4}", c.latitude), format!("{:.4}", c.longitude)),
        None => ("--".to_string(), "--".to_string()),
    };
    let error = state
        .error
        .as_deref()
        .map(|e| format!(" | Error: {e}"))
        .unwrap_or_default();
    format!("Using: lat {lat}, lon {lon} ({}){error}", state.source)
}

#[must_use]
pub fn receipt(receipt: &Receipt) -> String {
    let mut out = String::new();
    let rows = [
        ("Now", &receipt.temp_now),
        ("Yesterday", &receipt.temp_yesterday),
        ("Delta", &receipt.temp_delta),
        ("Wind", &receipt.wind_now),
        ("Rain", &receipt.rain_now),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "  {label:<10}{value:>12}");
    }
    let _ = write!(out, "  {}", receipt.summary);
    out
}

#[must_use]
pub fn card(index: usize, card: &IcebreakerCard) -> String {
    format!(
        "Icebreaker {}\n  Say: {}\n  Ask: {}\n  Twist: {}",
        index + 1,
        card.say,
        card.ask,
        card.twist
    )
}

/// Everything the page shows, top to bottom
#[must_use]
pub fn page(state: &AppState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", location_line(state));
    if let Some(link) = &state.copied_link {
        let _ = writeln!(out, "Link copied: {link}");
    }
    if state.loading {
        let _ = writeln!(out, "Loading...");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", receipt(&Receipt::from(state.weather.as_ref())));
    for (index, c) in state.cards.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", card(index, c));
    }
    out
}
