//! Configuration module for the query assistant.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the API client
//! and audio capture, `AppPaths` for cross-platform config directories, and
//! TOML persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{ApiConfig, AppConfig, AudioConfig, API_URL_ENV};
