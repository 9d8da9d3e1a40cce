use serde::{Deserialize, Serialize};

use crate::domain::{Event, EventId, UserId};

/// Body of `POST /login` and `POST /register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub event_ids: Vec<EventId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `POST /api/events/register` and `POST /api/events/unregister`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegistrationToggleRequest {
    pub user_id: UserId,
    pub event_id: EventId,
}

/// Generic `{success, message}` envelope returned by the event endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Daily user sign-ups, shown on the dashboard.
    Registrations,
    /// Per-event registration counts, shown on the home view.
    EventRegistrations,
}

impl ChartKind {
    pub const ALL: [ChartKind; 2] = [ChartKind::Registrations, ChartKind::EventRegistrations];

    pub fn path(self) -> &'static str {
        match self {
            ChartKind::Registrations => "/stats/registrations.png",
            ChartKind::EventRegistrations => "/stats/event_registrations.png",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::Registrations => "Daily User Registrations",
            ChartKind::EventRegistrations => "Event Registrations",
        }
    }
}
