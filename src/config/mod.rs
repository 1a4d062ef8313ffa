pub mod env;
pub mod handler;
