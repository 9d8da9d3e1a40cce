//! Event catalog snapshot and the card view-model the front ends draw.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use shared::domain::{Event, EventId};
use url::Url;

pub const FAILED_TO_LOAD_EVENTS: &str = "Failed to load events";
pub const NO_EVENTS_AVAILABLE: &str = "No events available";
pub const DEFAULT_EVENT_DESCRIPTION: &str = "Join us for an amazing event!";
pub const DATE_TBD: &str = "Date TBD";

const PLACEHOLDER_PALETTE: [(&str, &str); 3] =
    [("39ff14", "TECH"), ("03dac6", "CULTURE"), ("9945FF", "SPORTS")];

/// Transient copy of the backend's event list for the current render cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Catalog {
    #[default]
    NotLoaded,
    Loaded(Vec<Event>),
    Failed,
}

/// Stand-in artwork for an event card, chosen by the card's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    pub color_hex: &'static str,
    pub label: &'static str,
}

impl Placeholder {
    pub fn for_index(index: usize) -> Self {
        let (color_hex, label) = PLACEHOLDER_PALETTE[index % PLACEHOLDER_PALETTE.len()];
        Self { color_hex, label }
    }

    pub fn url(&self) -> String {
        format!(
            "https://via.placeholder.com/400x300/{}/000000?text={}",
            self.color_hex, self.label
        )
    }

    pub fn rgb(&self) -> [u8; 3] {
        let channel = |offset: usize| {
            self.color_hex
                .get(offset..offset + 2)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .unwrap_or(0)
        };
        [channel(0), channel(2), channel(4)]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCard {
    pub id: EventId,
    pub name: String,
    pub date_label: String,
    pub description: String,
    /// Server image resolved against the backend, or the placeholder URL.
    pub image_src: String,
    /// Used in place of `image_src` when that image cannot be loaded.
    pub fallback: Placeholder,
    pub registration_count: i64,
    pub registered: bool,
    /// A register/unregister request for this event is in flight.
    pub pending: bool,
}

impl EventCard {
    pub fn button_label(&self) -> &'static str {
        if self.registered {
            "✓ Registered"
        } else {
            "Register"
        }
    }

    pub fn has_server_image(&self) -> bool {
        self.image_src != self.fallback.url()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogView {
    /// A single line of text instead of cards.
    Message(&'static str),
    Cards(Vec<EventCard>),
}

pub fn render_catalog(
    catalog: &Catalog,
    registered: &BTreeSet<EventId>,
    pending: &BTreeSet<EventId>,
    base_url: &Url,
) -> CatalogView {
    match catalog {
        Catalog::Failed => CatalogView::Message(FAILED_TO_LOAD_EVENTS),
        Catalog::NotLoaded => CatalogView::Cards(Vec::new()),
        Catalog::Loaded(events) if events.is_empty() => CatalogView::Message(NO_EVENTS_AVAILABLE),
        Catalog::Loaded(events) => {
            CatalogView::Cards(render_event_cards(events, registered, pending, base_url))
        }
    }
}

pub fn render_event_cards(
    events: &[Event],
    registered: &BTreeSet<EventId>,
    pending: &BTreeSet<EventId>,
    base_url: &Url,
) -> Vec<EventCard> {
    events
        .iter()
        .enumerate()
        .map(|(index, event)| {
            let fallback = Placeholder::for_index(index);
            let image_src = match event.image_url.as_deref() {
                Some(raw) if !raw.trim().is_empty() => base_url
                    .join(raw)
                    .map(|url| url.to_string())
                    .unwrap_or_else(|_| raw.to_string()),
                _ => fallback.url(),
            };
            let description = match event.description.as_deref() {
                Some(text) if !text.is_empty() => text.to_string(),
                _ => DEFAULT_EVENT_DESCRIPTION.to_string(),
            };
            EventCard {
                id: event.id,
                name: event.name.clone(),
                date_label: format_event_date(event.event_date.as_deref()),
                description,
                image_src,
                fallback,
                registration_count: event.registration_count,
                registered: registered.contains(&event.id),
                pending: pending.contains(&event.id),
            }
        })
        .collect()
}

/// `2025-03-15` becomes `March 15, 2025`. Also understands RFC 3339 and the
/// RFC 2822 / HTTP-date form some backends emit for date columns.
pub fn format_event_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return DATE_TBD.to_string();
    };
    match parse_event_date(raw) {
        Some(date) => date.format("%B %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
