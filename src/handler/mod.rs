//! Transport-agnostic final handler: resolution, negotiation, rendering
//! and finalization over the [`RequestStream`] / [`ResponseSink`] ports.

pub mod final_handler;
pub mod finalize;
pub mod negotiate;
pub mod reason;
pub mod render;
pub mod resolve;

#[cfg(test)]
pub(crate) mod testing;

pub use final_handler::{Disposition, ErrorReporter, FinalHandler, Options};
pub use finalize::{RequestStream, ResponseSink};
