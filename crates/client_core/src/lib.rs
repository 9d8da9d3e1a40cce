use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex as StdMutex, PoisonError},
};

use shared::{
    domain::{EventId, Session, UserId},
    protocol::{ChartKind, Credentials, RegistrationToggleRequest},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use url::Url;

pub mod backend;
pub mod catalog;
pub mod charts;
pub mod config;
pub mod error;
pub mod session_store;
pub mod view;

pub use backend::{EventBackend, HttpBackend};
pub use catalog::{Catalog, CatalogView, EventCard, Placeholder};
pub use charts::{ChartSource, ChartUrls};
pub use error::{BackendError, ClientError};
pub use session_store::{FileSessionStore, MemorySessionStore, SessionStore};
pub use view::{NavState, View, ViewEffect};

use catalog::render_catalog;
use charts::{chart_url, CacheBuster};
use config::ClientSettings;
use session_store::{clear_session, load_session, save_session};

pub const LOGIN_SUCCESS_NOTICE: &str = "Login Successful!";
pub const LOGIN_FAILED_NOTICE: &str = "Login Failed";
pub const REGISTER_SUCCESS_NOTICE: &str = "Registration Successful! Please Login.";
pub const REGISTER_FAILED_NOTICE: &str = "Registration Failed";
pub const LOGOUT_NOTICE: &str = "Logged out successfully";
pub const LOGIN_REQUIRED_NOTICE: &str = "Please login to register for events";
pub const EVENT_REGISTERED_NOTICE: &str = "Registered successfully!";
pub const EVENT_UNREGISTERED_NOTICE: &str = "Unregistered from event";
pub const OPERATION_FAILED_NOTICE: &str = "Operation failed";

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Short user-facing message, shown as a toast by the front ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    StateChanged(Arc<AppSnapshot>),
    Notice(Notice),
}

/// Point-in-time copy of everything a front end needs to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct AppSnapshot {
    pub base_url: Url,
    pub session: Option<Session>,
    pub registered: BTreeSet<EventId>,
    pub view: View,
    pub nav: NavState,
    pub catalog: Catalog,
    pub charts: ChartUrls,
    pub pending_toggles: BTreeSet<EventId>,
    pub last_notice: Option<Notice>,
}

impl AppSnapshot {
    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn catalog_view(&self) -> CatalogView {
        render_catalog(
            &self.catalog,
            &self.registered,
            &self.pending_toggles,
            &self.base_url,
        )
    }
}

/// Everything the user can do, independent of how the front end wires it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    Navigate(View),
    SubmitLogin { username: String, password: String },
    SubmitRegister { username: String, password: String },
    Logout,
    ToggleRegistration(EventId),
    RefreshEvents,
    RefreshChart(ChartKind),
}

impl UiAction {
    pub fn name(&self) -> &'static str {
        match self {
            UiAction::Navigate(_) => "navigate",
            UiAction::SubmitLogin { .. } => "submit_login",
            UiAction::SubmitRegister { .. } => "submit_register",
            UiAction::Logout => "logout",
            UiAction::ToggleRegistration(_) => "toggle_registration",
            UiAction::RefreshEvents => "refresh_events",
            UiAction::RefreshChart(_) => "refresh_chart",
        }
    }
}

/// The `(view, action)` table: which actions the active view can trigger.
pub fn accepts(view: View, action: &UiAction) -> bool {
    match (view, action) {
        (_, UiAction::Navigate(_)) | (_, UiAction::Logout) => true,
        (View::Login, UiAction::SubmitLogin { .. }) => true,
        (View::Register, UiAction::SubmitRegister { .. }) => true,
        (View::Home, UiAction::ToggleRegistration(_))
        | (View::Home, UiAction::RefreshEvents)
        | (View::Home, UiAction::RefreshChart(ChartKind::EventRegistrations)) => true,
        (View::Dashboard, UiAction::RefreshChart(ChartKind::Registrations)) => true,
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    Ignored { view: View, action: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// No session: the user was sent to the login view, nothing was sent.
    LoginRequired,
    /// A request for the same event is still running; nothing was sent.
    AlreadyInFlight,
    Registered,
    Unregistered,
    Failed(BackendError),
}

struct ControllerState {
    session: Option<Session>,
    registered: BTreeSet<EventId>,
    view: View,
    catalog: Catalog,
    charts: ChartUrls,
    cache_buster: CacheBuster,
    last_notice: Option<Notice>,
}

impl ControllerState {
    fn session_id(&self) -> Option<UserId> {
        self.session.as_ref().map(|session| session.id)
    }
}

type InFlightSet = Arc<StdMutex<BTreeSet<EventId>>>;

/// Marks an event's control disabled until dropped.
struct InFlightToggle {
    set: InFlightSet,
    event_id: EventId,
}

impl InFlightToggle {
    fn acquire(set: &InFlightSet, event_id: EventId) -> Option<Self> {
        let mut guard = set.lock().unwrap_or_else(PoisonError::into_inner);
        if !guard.insert(event_id) {
            return None;
        }
        Some(Self {
            set: Arc::clone(set),
            event_id,
        })
    }
}

impl Drop for InFlightToggle {
    fn drop(&mut self) {
        let mut guard = self.set.lock().unwrap_or_else(PoisonError::into_inner);
        guard.remove(&self.event_id);
    }
}

/// Owns the session, the visible view, the event catalog and the
/// registered-event set. Every mutation goes through one of its methods;
/// the state lock is never held across a backend call.
pub struct AppController {
    backend: Arc<dyn EventBackend>,
    store: Arc<dyn SessionStore>,
    base_url: Url,
    inner: Mutex<ControllerState>,
    in_flight: InFlightSet,
    events: broadcast::Sender<ClientEvent>,
}

impl AppController {
    pub fn new(
        backend: Arc<dyn EventBackend>,
        store: Arc<dyn SessionStore>,
        base_url: Url,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            backend,
            store,
            base_url,
            inner: Mutex::new(ControllerState {
                session: None,
                registered: BTreeSet::new(),
                view: View::default(),
                catalog: Catalog::default(),
                charts: ChartUrls::default(),
                cache_buster: CacheBuster::default(),
                last_notice: None,
            }),
            in_flight: Arc::new(StdMutex::new(BTreeSet::new())),
            events,
        })
    }

    /// HTTP backend plus the on-disk session store from `settings`.
    pub fn from_settings(settings: &ClientSettings) -> Result<Arc<Self>, ClientError> {
        let backend = HttpBackend::new(&settings.server_url)?;
        let base_url = backend.base_url().clone();
        let store = FileSessionStore::in_dir(&settings.resolved_data_dir());
        debug!(path = %store.path().display(), "using session storage");
        Ok(Self::new(Arc::new(backend), Arc::new(store), base_url))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> AppSnapshot {
        let guard = self.inner.lock().await;
        let pending_toggles = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        AppSnapshot {
            base_url: self.base_url.clone(),
            session: guard.session.clone(),
            registered: guard.registered.clone(),
            view: guard.view,
            nav: NavState::derive(guard.view, guard.session.is_some()),
            catalog: guard.catalog.clone(),
            charts: guard.charts.clone(),
            pending_toggles,
            last_notice: guard.last_notice.clone(),
        }
    }

    pub async fn session(&self) -> Option<Session> {
        self.inner.lock().await.session.clone()
    }

    /// Page-load sequence: pick up a persisted session, then show home.
    pub async fn start(&self) {
        self.restore_session().await;
        self.show_view(View::Home).await;
    }

    /// Adopts the persisted session, if any, and fetches its registrations.
    /// Missing or malformed storage leaves the visitor anonymous without a
    /// notice.
    pub async fn restore_session(&self) -> Option<Session> {
        let session = load_session(self.store.as_ref())?;
        {
            let mut guard = self.inner.lock().await;
            guard.session = Some(session.clone());
            guard.registered.clear();
        }
        info!(user_id = %session.id, username = %session.username, "restored session");
        self.load_user_registrations().await;
        self.publish_state().await;
        Some(session)
    }

    /// The session's username is the one typed in; the backend only returns
    /// the user id.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        let credentials = Credentials::new(username, password);
        let user_id = match self.backend.login(&credentials).await {
            Ok(user_id) => user_id,
            Err(err) => {
                debug!(username, "login failed: {err}");
                self.notify(Notice::error(err.notice_text(LOGIN_FAILED_NOTICE)))
                    .await;
                return Err(err.into());
            }
        };

        let session = Session {
            id: user_id,
            username: username.to_string(),
        };
        if let Err(err) = save_session(self.store.as_ref(), &session) {
            warn!("failed to persist session: {err}");
        }
        {
            let mut guard = self.inner.lock().await;
            guard.session = Some(session.clone());
            guard.registered.clear();
        }
        info!(user_id = %session.id, username, "signed in");

        self.load_user_registrations().await;
        self.notify(Notice::info(LOGIN_SUCCESS_NOTICE)).await;
        self.show_view(View::Home).await;
        Ok(session)
    }

    /// Creates an account. Success sends the user to the login view; it
    /// does not sign them in.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let credentials = Credentials::new(username, password);
        match self.backend.register(&credentials).await {
            Ok(()) => {
                info!(username, "account registered");
                self.notify(Notice::info(REGISTER_SUCCESS_NOTICE)).await;
                self.show_view(View::Login).await;
                Ok(())
            }
            Err(err) => {
                debug!(username, "registration failed: {err}");
                self.notify(Notice::error(err.notice_text(REGISTER_FAILED_NOTICE)))
                    .await;
                Err(err.into())
            }
        }
    }

    pub async fn logout(&self) {
        let previous = {
            let mut guard = self.inner.lock().await;
            guard.registered.clear();
            guard.session.take()
        };
        if let Err(err) = clear_session(self.store.as_ref()) {
            warn!("failed to remove persisted session: {err}");
        }
        if let Some(session) = previous {
            info!(user_id = %session.id, "signed out");
        }
        self.show_view(View::Home).await;
        self.notify(Notice::info(LOGOUT_NOTICE)).await;
    }

    pub async fn show_view(&self, view: View) {
        {
            let mut guard = self.inner.lock().await;
            guard.view = view;
        }
        debug!(%view, "showing view");
        for effect in view.entry_effects() {
            match *effect {
                ViewEffect::ReloadEvents => self.load_events().await,
                ViewEffect::ReloadChart(kind) => self.reload_chart(kind).await,
            }
        }
        self.publish_state().await;
    }

    /// Refreshes the catalog. Failures leave a failed placeholder in place of
    /// the list.
    pub async fn load_events(&self) {
        let result = self.backend.list_events().await;
        {
            let mut guard = self.inner.lock().await;
            guard.catalog = match result {
                Ok(events) => {
                    debug!(count = events.len(), "loaded events");
                    Catalog::Loaded(events)
                }
                Err(err) => {
                    warn!("failed to load events: {err}");
                    Catalog::Failed
                }
            };
        }
        self.publish_state().await;
    }

    /// Replaces the registered-event set with the backend's copy.
    pub async fn load_user_registrations(&self) {
        let user_id = self.inner.lock().await.session_id();
        let Some(user_id) = user_id else {
            return;
        };
        match self.backend.user_registrations(user_id).await {
            Ok(event_ids) => {
                let mut guard = self.inner.lock().await;
                // The session may have ended while the request was out.
                if guard.session_id() == Some(user_id) {
                    guard.registered = event_ids.into_iter().collect();
                }
            }
            Err(err) => warn!(%user_id, "failed to load user registrations: {err}"),
        }
    }

    /// Points `kind` at a fresh cache-busted URL.
    pub async fn reload_chart(&self, kind: ChartKind) {
        {
            let mut guard = self.inner.lock().await;
            let stamp = guard.cache_buster.next();
            match chart_url(&self.base_url, kind, stamp) {
                Ok(url) => guard.charts.set(ChartSource { kind, url, stamp }),
                Err(err) => warn!(?kind, "failed to build chart url: {err}"),
            }
        }
        self.publish_state().await;
    }

    pub async fn toggle_event_registration(&self, event_id: EventId) -> ToggleOutcome {
        let user_id = self.inner.lock().await.session_id();
        let Some(user_id) = user_id else {
            self.notify(Notice::error(LOGIN_REQUIRED_NOTICE)).await;
            self.show_view(View::Login).await;
            return ToggleOutcome::LoginRequired;
        };

        let Some(in_flight) = InFlightToggle::acquire(&self.in_flight, event_id) else {
            debug!(%event_id, "toggle already in flight");
            return ToggleOutcome::AlreadyInFlight;
        };
        self.publish_state().await;

        let was_registered = self.inner.lock().await.registered.contains(&event_id);
        let request = RegistrationToggleRequest { user_id, event_id };
        let result = if was_registered {
            self.backend.unregister_from_event(request).await
        } else {
            self.backend.register_for_event(request).await
        };

        let outcome = match result {
            Ok(()) => {
                {
                    let mut guard = self.inner.lock().await;
                    if guard.session_id() == Some(user_id) {
                        if was_registered {
                            guard.registered.remove(&event_id);
                        } else {
                            guard.registered.insert(event_id);
                        }
                    }
                }
                info!(%event_id, registered = !was_registered, "registration toggled");
                let notice = if was_registered {
                    EVENT_UNREGISTERED_NOTICE
                } else {
                    EVENT_REGISTERED_NOTICE
                };
                self.notify(Notice::info(notice)).await;
                self.load_events().await;
                self.reload_chart(ChartKind::EventRegistrations).await;
                if was_registered {
                    ToggleOutcome::Unregistered
                } else {
                    ToggleOutcome::Registered
                }
            }
            Err(err) => {
                warn!(%event_id, "registration toggle failed: {err}");
                self.notify(Notice::error(err.notice_text(OPERATION_FAILED_NOTICE)))
                    .await;
                ToggleOutcome::Failed(err)
            }
        };

        drop(in_flight);
        self.publish_state().await;
        outcome
    }

    /// Routes an action through the `(view, action)` table.
    pub async fn dispatch(&self, action: UiAction) -> DispatchOutcome {
        let view = self.inner.lock().await.view;
        if !accepts(view, &action) {
            debug!(%view, action = action.name(), "ignoring action not offered by view");
            return DispatchOutcome::Ignored {
                view,
                action: action.name(),
            };
        }

        match action {
            UiAction::Navigate(target) => self.show_view(target).await,
            UiAction::SubmitLogin { username, password } => {
                let _ = self.login(&username, &password).await;
            }
            UiAction::SubmitRegister { username, password } => {
                let _ = self.register(&username, &password).await;
            }
            UiAction::Logout => self.logout().await,
            UiAction::ToggleRegistration(event_id) => {
                self.toggle_event_registration(event_id).await;
            }
            UiAction::RefreshEvents => self.load_events().await,
            UiAction::RefreshChart(kind) => self.reload_chart(kind).await,
        }
        DispatchOutcome::Handled
    }

    async fn notify(&self, notice: Notice) {
        debug!(kind = ?notice.kind, message = %notice.message, "notice");
        self.inner.lock().await.last_notice = Some(notice.clone());
        let _ = self.events.send(ClientEvent::Notice(notice));
    }

    async fn publish_state(&self) {
        let snapshot = self.snapshot().await;
        let _ = self.events.send(ClientEvent::StateChanged(Arc::new(snapshot)));
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
