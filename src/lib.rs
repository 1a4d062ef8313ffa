//! # final_handler
//!
//! The last handler in an HTTP request chain. It runs when nothing else
//! produced a response, or when an upstream handler failed, and answers
//! with a status code and a minimal HTML or plain-text body.
//!
//! This crate provides:
//! - A transport-agnostic handler (`handler`) that waits for the request
//!   stream to finish before writing and defers error reporting
//! - An axum fallback and error responder (`web`)
//! - The error signal type passed by upstream handlers (`error`)
//! - Environment-driven configuration (`config`)
//!
//! ## Example usage (in another crate)
//!
//! ```rust,no_run
//! use final_handler::axum::{routing::get, Router};
//! use final_handler::web::not_found;
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "hello" }))
//!     .fallback(not_found);
//! ```
// ===============================
// Re-exports of external crates
// ===============================

pub use anyhow;
pub use axum;
pub use tracing;

// ===============================
// Public modules
// ===============================
pub mod config;
pub mod error;
pub mod handler;
pub mod web;

pub use error::signal::HandlerError;
