//! UI layer for desktop GUI: app shell, views, and image handling.

pub mod app;
pub mod images;

pub use app::DesktopGuiApp;
