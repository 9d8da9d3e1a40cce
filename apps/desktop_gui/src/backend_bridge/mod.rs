//! Worker thread that owns the async controller and the HTTP image fetcher.

pub mod commands;
pub mod runtime;
