//! UI/backend events and error modeling for desktop GUI controller.

use std::sync::Arc;

use client_core::{AppSnapshot, Notice};

use crate::ui::images::DecodedImage;

pub enum UiEvent {
    Info(String),
    State(Arc<AppSnapshot>),
    Notice(Notice),
    ImageLoaded { url: String, image: DecodedImage },
    ImageFailed { url: String, reason: String },
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Config,
    Transport,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    CommandQueue,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let category = if lower.contains("invalid server url")
            || lower.contains("relative url")
            || lower.contains("invalid")
        {
            UiErrorCategory::Config
        } else if lower.contains("connection")
            || lower.contains("network")
            || lower.contains("timed out")
            || lower.contains("disconnected")
            || lower.contains("runtime")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Config => "Configuration",
        UiErrorCategory::Transport => "Connection",
        UiErrorCategory::Unknown => "Error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_bad_server_url_as_config_error() {
        let err = UiError::from_message(
            UiErrorContext::BackendStartup,
            "invalid server url 'localhost:5000': relative URL without a base",
        );
        assert_eq!(err.category(), UiErrorCategory::Config);
        assert_eq!(err.context(), UiErrorContext::BackendStartup);
        assert_eq!(err_label(err.category()), "Configuration");
    }

    #[test]
    fn classifies_worker_disconnect_as_transport_error() {
        let err = UiError::from_message(
            UiErrorContext::CommandQueue,
            "Backend command processor disconnected",
        );
        assert_eq!(err.category(), UiErrorCategory::Transport);
        assert!(err.message().starts_with("Backend"));
    }
}
