//! # Final Handler Configuration
//!
//! Environment-driven settings shared by every invocation of the final
//! handler.
//!
//! Like the rest of the configuration layer, non-production environments
//! load a dotenv file first. A custom `DOTENV_FILE` path wins, then
//! `.env.{APP_ENV}`, then `.env`.
//!
//! # Environment Variables
//! | Variable | Description | Default |
//! |-----------|-------------|----------|
//! | `APP_ENV` | Current environment (`development`, `production`, etc.) | `"development"` |
//! | `DOTENV_FILE` | Optional path to a custom dotenv file | *none* |
//! | `FINAL_HANDLER_STACKTRACE` | Put error detail text into response bodies | `false` |
//! | `FINAL_HANDLER_DRAIN_LIMIT_BYTES` | Request bytes drained before responding | `1048576` |
//!
//! # Example
//! ```rust
//! use final_handler::config::handler::FinalHandlerConfig;
//!
//! let cfg = FinalHandlerConfig::from_env_with(|k| match k {
//!     "FINAL_HANDLER_STACKTRACE" => Some("true".into()),
//!     _ => None,
//! });
//! assert!(cfg.stacktrace);
//! assert_eq!(cfg.drain_limit, 1024 * 1024);
//! ```

use std::env;

use tracing::info;

use crate::config::env::{read_flag_from, read_usize_from};

/// Default upper bound for draining an unread request body.
pub const DEFAULT_DRAIN_LIMIT: usize = 1024 * 1024;

/// Settings fixed for the lifetime of a constructed handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalHandlerConfig {
    /// When `true`, error detail text (not sanitized) is written into the
    /// response body instead of the canonical reason phrase.
    pub stacktrace: bool,
    /// Maximum number of request body bytes the axum adapter reads off
    /// the connection before responding.
    pub drain_limit: usize,
}

impl Default for FinalHandlerConfig {
    fn default() -> Self {
        Self {
            stacktrace: false,
            drain_limit: DEFAULT_DRAIN_LIMIT,
        }
    }
}

impl FinalHandlerConfig {
    /// Loads configuration from the process environment.
    ///
    /// Reads `APP_ENV` (defaults to `"development"`) and loads a dotenv
    /// file unless running in production.
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        if app_env != "production" {
            if let Ok(path) = env::var("DOTENV_FILE") {
                let _ = dotenvy::from_filename(path);
            } else {
                let candidate = format!(".env.{}", app_env);
                dotenvy::from_filename(&candidate)
                    .or_else(|_| dotenvy::dotenv())
                    .ok();
            }
        }

        let cfg = Self::from_env_with(|k| env::var(k).ok());
        info!(
            app_env = %app_env,
            stacktrace = cfg.stacktrace,
            drain_limit = cfg.drain_limit,
            "final handler configured"
        );
        cfg
    }

    /// Loads configuration using a custom key provider (for testing/mocking).
    pub fn from_env_with<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            stacktrace: read_flag_from(&get, "FINAL_HANDLER_STACKTRACE", false),
            drain_limit: read_usize_from(&get, "FINAL_HANDLER_DRAIN_LIMIT_BYTES", DEFAULT_DRAIN_LIMIT),
        }
    }
}
