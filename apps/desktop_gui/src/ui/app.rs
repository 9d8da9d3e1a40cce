use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use client_core::{
    AppSnapshot, CatalogView, ChartSource, EventCard, Notice, NoticeKind, Placeholder, UiAction,
    View,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::protocol::ChartKind;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{err_label, UiError, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use crate::ui::images::{placeholder_color, ImageCache, ImageSlot};

const ACCENT: egui::Color32 = egui::Color32::from_rgb(0x39, 0xff, 0x14);
const CARD_WIDTH: f32 = 280.0;
const CARD_IMAGE_HEIGHT: f32 = 160.0;
const CARD_SPACING: f32 = 16.0;
const MAX_CHART_WIDTH: f32 = 760.0;
const FORM_WIDTH: f32 = 360.0;

struct Toast {
    notice: Notice,
    expires_at: Instant,
}

impl Toast {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Default)]
struct CredentialsForm {
    username: String,
    password: String,
}

impl CredentialsForm {
    /// Trimmed username plus the password; the password field is cleared.
    /// `None` while either field is blank.
    fn take_submission(&mut self) -> Option<(String, String)> {
        let username = self.username.trim().to_string();
        if username.is_empty() || self.password.is_empty() {
            return None;
        }
        Some((username, std::mem::take(&mut self.password)))
    }
}

pub struct DesktopGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    snapshot: Option<Arc<AppSnapshot>>,
    images: ImageCache,
    toast: Option<Toast>,
    notice_duration: Duration,
    status: String,
    status_banner: Option<UiError>,
    login_form: CredentialsForm,
    register_form: CredentialsForm,
}

impl DesktopGuiApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        notice_duration: Duration,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            snapshot: None,
            images: ImageCache::default(),
            toast: None,
            notice_duration,
            status: "Starting".to_string(),
            status_banner: None,
            login_form: CredentialsForm::default(),
            register_form: CredentialsForm::default(),
        }
    }

    fn process_ui_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::State(snapshot) => {
                    self.images.retain_for(&snapshot);
                    self.snapshot = Some(snapshot);
                }
                UiEvent::Notice(notice) => self.show_toast(notice),
                UiEvent::ImageLoaded { url, image } => {
                    self.images.store(ctx, url, image);
                }
                UiEvent::ImageFailed { url, reason } => {
                    tracing::debug!(%url, "using placeholder: {reason}");
                    self.images.mark_failed(url);
                }
                UiEvent::Error(err) => {
                    tracing::warn!(context = ?err.context(), "{}", err.message());
                    self.status = err.message().to_string();
                    self.status_banner = Some(err);
                }
            }
        }
    }

    fn show_toast(&mut self, notice: Notice) {
        self.toast = Some(Toast {
            notice,
            expires_at: Instant::now() + self.notice_duration,
        });
    }

    fn send(&mut self, cmd: BackendCommand) {
        if let Err(message) = dispatch_backend_command(&self.cmd_tx, cmd) {
            self.status = message.clone();
            self.status_banner = Some(UiError::from_message(UiErrorContext::CommandQueue, message));
        }
    }

    fn act(&mut self, action: UiAction) {
        self.send(BackendCommand::Action(action));
    }

    /// Queues a download the first time `url` is drawn.
    fn request_image(&mut self, url: &str) {
        if self.images.begin_fetch(url) {
            self.send(BackendCommand::FetchImage {
                url: url.to_string(),
            });
        }
    }

    fn show_nav_bar(&mut self, ctx: &egui::Context, snapshot: &AppSnapshot) {
        let nav = snapshot.nav;
        egui::TopBottomPanel::top("nav_bar").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("EVENTREG").strong().size(20.0).color(ACCENT));
                ui.separator();

                let links = [
                    (View::Home, nav.home_visible),
                    (View::Login, nav.login_visible),
                    (View::Register, nav.register_visible),
                    (View::Dashboard, nav.dashboard_visible),
                ];
                for (view, visible) in links {
                    if visible
                        && ui
                            .selectable_label(nav.active == Some(view), view.label())
                            .clicked()
                    {
                        self.act(UiAction::Navigate(view));
                    }
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if nav.logout_visible && ui.button("Logout").clicked() {
                        self.act(UiAction::Logout);
                    }
                    if let Some(session) = &snapshot.session {
                        ui.weak(format!("Signed in as {}", session.username));
                    }
                });
            });
            ui.add_space(6.0);
        });
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            egui::Frame::NONE
                .fill(egui::Color32::from_rgb(111, 53, 53))
                .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(
                            egui::RichText::new(format!(
                                "{}: {}",
                                err_label(banner.category()),
                                banner.message()
                            ))
                            .color(egui::Color32::WHITE),
                        );
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.status_banner = None;
                            }
                        });
                    });
                });
            ui.add_space(8.0);
        }
    }

    fn show_home(&mut self, ui: &mut egui::Ui, snapshot: &AppSnapshot) {
        ui.heading(egui::RichText::new("Upcoming Events").strong());
        ui.weak("Pick an event and save your spot.");
        ui.add_space(12.0);

        match snapshot.catalog_view() {
            CatalogView::Message(message) => {
                ui.label(egui::RichText::new(message).italics());
            }
            CatalogView::Cards(cards) if cards.is_empty() => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.weak("Loading events...");
                });
            }
            CatalogView::Cards(cards) => {
                let columns = ((ui.available_width() + CARD_SPACING)
                    / (CARD_WIDTH + CARD_SPACING))
                    .floor()
                    .max(1.0) as usize;
                for row in cards.chunks(columns) {
                    ui.horizontal_top(|ui| {
                        ui.spacing_mut().item_spacing.x = CARD_SPACING;
                        for card in row {
                            self.show_event_card(ui, card);
                        }
                    });
                    ui.add_space(CARD_SPACING);
                }
            }
        }

        ui.add_space(16.0);
        self.show_chart(
            ui,
            ChartKind::EventRegistrations,
            snapshot.charts.get(ChartKind::EventRegistrations),
        );
    }

    fn show_event_card(&mut self, ui: &mut egui::Ui, card: &EventCard) {
        egui::Frame::group(ui.style())
            .corner_radius(10.0)
            .inner_margin(egui::Margin::same(12))
            .show(ui, |ui| {
                ui.set_width(CARD_WIDTH);
                self.show_card_image(ui, card);
                ui.add_space(6.0);
                ui.label(egui::RichText::new(&card.name).strong().size(18.0));
                ui.label(egui::RichText::new(&card.date_label).color(ACCENT));
                ui.label(&card.description);
                ui.small(format!("{} registered", card.registration_count));
                ui.add_space(4.0);

                let mut button = egui::Button::new(card.button_label())
                    .min_size(egui::vec2(ui.available_width(), 30.0));
                if card.registered {
                    button = button.fill(ACCENT.gamma_multiply(0.35));
                }
                ui.horizontal(|ui| {
                    if ui.add_enabled(!card.pending, button).clicked() {
                        self.act(UiAction::ToggleRegistration(card.id));
                    }
                    if card.pending {
                        ui.spinner();
                    }
                });
            });
    }

    fn show_card_image(&mut self, ui: &mut egui::Ui, card: &EventCard) {
        let size = egui::vec2(CARD_WIDTH, CARD_IMAGE_HEIGHT);
        if card.has_server_image() {
            self.request_image(&card.image_src);
            if let Some(ImageSlot::Ready(texture)) = self.images.get(&card.image_src) {
                ui.add(egui::Image::new(texture).fit_to_exact_size(size));
                return;
            }
        }
        paint_placeholder(ui, &card.fallback, size);
    }

    fn show_chart(&mut self, ui: &mut egui::Ui, kind: ChartKind, source: Option<&ChartSource>) {
        ui.horizontal(|ui| {
            ui.heading(kind.title());
            if ui.small_button("Refresh").clicked() {
                self.act(UiAction::RefreshChart(kind));
            }
        });
        ui.add_space(6.0);

        let Some(source) = source else {
            ui.weak("Chart not loaded yet");
            return;
        };
        let url = source.url.to_string();
        self.request_image(&url);
        match self.images.get(&url) {
            Some(ImageSlot::Ready(texture)) => {
                let native = texture.size_vec2();
                let width = ui.available_width().min(MAX_CHART_WIDTH);
                let height = if native.x > 0.0 {
                    width * native.y / native.x
                } else {
                    width / 2.0
                };
                ui.add(egui::Image::new(texture).fit_to_exact_size(egui::vec2(width, height)));
            }
            Some(ImageSlot::Failed) => {
                ui.colored_label(ui.visuals().error_fg_color, "Chart unavailable");
            }
            Some(ImageSlot::Loading) | None => {
                ui.spinner();
            }
        }
    }

    fn show_credentials_form(
        &mut self,
        ui: &mut egui::Ui,
        title: &str,
        submit_label: &str,
        view: View,
    ) -> Option<(String, String)> {
        let mut submitted = None;
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.set_max_width(FORM_WIDTH);
            egui::Frame::group(ui.style())
                .corner_radius(12.0)
                .inner_margin(egui::Margin::symmetric(20, 18))
                .show(ui, |ui| {
                    ui.heading(title);
                    ui.add_space(8.0);
                    let form = match view {
                        View::Register => &mut self.register_form,
                        _ => &mut self.login_form,
                    };

                    ui.label(egui::RichText::new("Username").strong());
                    let user_resp = ui.add(
                        egui::TextEdit::singleline(&mut form.username)
                            .id_salt((view.label(), "username"))
                            .desired_width(f32::INFINITY),
                    );
                    ui.label(egui::RichText::new("Password").strong());
                    let pass_resp = ui.add(
                        egui::TextEdit::singleline(&mut form.password)
                            .id_salt((view.label(), "password"))
                            .password(true)
                            .desired_width(f32::INFINITY),
                    );
                    ui.add_space(8.0);

                    let enter_pressed = ui.input(|i| i.key_pressed(egui::Key::Enter));
                    let via_enter = enter_pressed && (user_resp.lost_focus() || pass_resp.lost_focus());
                    let clicked = ui
                        .add(
                            egui::Button::new(egui::RichText::new(submit_label).strong())
                                .min_size(egui::vec2(ui.available_width(), 36.0)),
                        )
                        .clicked();
                    if clicked || via_enter {
                        submitted = Some(form.take_submission());
                    }
                });
        });

        match submitted {
            Some(Some(credentials)) => Some(credentials),
            Some(None) => {
                self.show_toast(Notice::error("Username and password are required"));
                None
            }
            None => None,
        }
    }

    fn show_login(&mut self, ui: &mut egui::Ui) {
        if let Some((username, password)) =
            self.show_credentials_form(ui, "Welcome back", "Login", View::Login)
        {
            self.act(UiAction::SubmitLogin { username, password });
        }
        ui.vertical_centered(|ui| {
            if ui.link("Need an account? Register").clicked() {
                self.act(UiAction::Navigate(View::Register));
            }
        });
    }

    fn show_register(&mut self, ui: &mut egui::Ui) {
        if let Some((username, password)) =
            self.show_credentials_form(ui, "Create an account", "Register", View::Register)
        {
            self.act(UiAction::SubmitRegister { username, password });
        }
        ui.vertical_centered(|ui| {
            if ui.link("Already registered? Login").clicked() {
                self.act(UiAction::Navigate(View::Login));
            }
        });
    }

    fn show_dashboard(&mut self, ui: &mut egui::Ui, snapshot: &AppSnapshot) {
        ui.heading(egui::RichText::new("Dashboard").strong());
        if let Some(session) = &snapshot.session {
            ui.label(format!("Welcome, {}!", session.username));
        }
        ui.weak(format!(
            "You are registered for {} event(s).",
            snapshot.registered.len()
        ));
        ui.add_space(16.0);
        self.show_chart(
            ui,
            ChartKind::Registrations,
            snapshot.charts.get(ChartKind::Registrations),
        );
    }

    fn show_toast_area(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        if self.toast.as_ref().is_some_and(|toast| !toast.is_live(now)) {
            self.toast = None;
        }
        let Some(toast) = &self.toast else {
            return;
        };
        let fill = match toast.notice.kind {
            NoticeKind::Info => egui::Color32::from_rgb(30, 70, 40),
            NoticeKind::Error => egui::Color32::from_rgb(111, 53, 53),
        };
        egui::Area::new(egui::Id::new("notice_toast"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -36.0))
            .show(ctx, |ui| {
                egui::Frame::NONE
                    .fill(fill)
                    .corner_radius(8.0)
                    .inner_margin(egui::Margin::symmetric(14, 10))
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(&toast.notice.message).color(egui::Color32::WHITE),
                        );
                    });
            });
    }
}

fn paint_placeholder(ui: &mut egui::Ui, placeholder: &Placeholder, size: egui::Vec2) {
    let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
    let painter = ui.painter();
    painter.rect_filled(rect, 8.0, placeholder_color(placeholder));
    painter.text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        placeholder.label,
        egui::FontId::proportional(26.0),
        egui::Color32::BLACK,
    );
}

impl eframe::App for DesktopGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events(ctx);

        let snapshot = self.snapshot.clone();
        if let Some(snapshot) = &snapshot {
            self.show_nav_bar(ctx, snapshot);
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.small("Status:");
                ui.small(egui::RichText::new(&self.status).weak());
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_status_banner(ui);
            let Some(snapshot) = &snapshot else {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.weak("Connecting to the event server...");
                });
                return;
            };
            egui::ScrollArea::vertical().show(ui, |ui| match snapshot.view {
                View::Home => self.show_home(ui, snapshot),
                View::Login => self.show_login(ui),
                View::Register => self.show_register(ui),
                View::Dashboard => self.show_dashboard(ui, snapshot),
            });
        });

        self.show_toast_area(ctx);
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_trims_username_and_clears_password() {
        let mut form = CredentialsForm {
            username: "  alice ".into(),
            password: "x".into(),
        };
        assert_eq!(
            form.take_submission(),
            Some(("alice".to_string(), "x".to_string()))
        );
        assert!(form.password.is_empty());
        assert_eq!(form.username, "  alice ");
    }

    #[test]
    fn blank_fields_are_not_submitted() {
        let mut form = CredentialsForm {
            username: "   ".into(),
            password: "x".into(),
        };
        assert_eq!(form.take_submission(), None);
        assert_eq!(form.password, "x");
    }

    #[test]
    fn toast_expires_after_its_duration() {
        let start = Instant::now();
        let toast = Toast {
            notice: Notice::info("Registered successfully!"),
            expires_at: start + Duration::from_secs(3),
        };
        assert!(toast.is_live(start));
        assert!(toast.is_live(start + Duration::from_millis(2_999)));
        assert!(!toast.is_live(start + Duration::from_secs(3)));
    }
}
