pub mod fallback;
pub mod reply;

pub use fallback::{not_found, respond, ErrorContext, OnError};
