//! The four mutually exclusive views and the navigation chrome around them.

use std::fmt;

use shared::protocol::ChartKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    #[default]
    Home,
    Login,
    Register,
    Dashboard,
}

impl View {
    pub const ALL: [View; 4] = [View::Home, View::Login, View::Register, View::Dashboard];

    pub fn label(self) -> &'static str {
        match self {
            View::Home => "Home",
            View::Login => "Login",
            View::Register => "Register",
            View::Dashboard => "Dashboard",
        }
    }

    /// Work that entering this view kicks off.
    pub fn entry_effects(self) -> &'static [ViewEffect] {
        match self {
            View::Home => &[
                ViewEffect::ReloadEvents,
                ViewEffect::ReloadChart(ChartKind::EventRegistrations),
            ],
            View::Dashboard => &[ViewEffect::ReloadChart(ChartKind::Registrations)],
            View::Login | View::Register => &[],
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEffect {
    ReloadEvents,
    ReloadChart(ChartKind),
}

/// Which navigation controls are shown and which one carries the active marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavState {
    pub home_visible: bool,
    pub login_visible: bool,
    pub register_visible: bool,
    pub dashboard_visible: bool,
    pub logout_visible: bool,
    /// Dashboard has no nav link of its own, so it never carries the marker.
    pub active: Option<View>,
}

impl NavState {
    pub fn derive(view: View, signed_in: bool) -> Self {
        Self {
            home_visible: true,
            login_visible: !signed_in,
            register_visible: !signed_in,
            dashboard_visible: signed_in,
            logout_visible: signed_in,
            active: match view {
                View::Dashboard => None,
                other => Some(other),
            },
        }
    }

    pub fn is_consistent_with(&self, signed_in: bool) -> bool {
        self.login_visible != signed_in
            && self.register_visible != signed_in
            && self.logout_visible == signed_in
    }
}

impl Default for NavState {
    fn default() -> Self {
        Self::derive(View::default(), false)
    }
}
