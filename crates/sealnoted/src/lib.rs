//! sealnoted library surface (shared between the binary and the API tests)

pub mod auth;
pub mod error;
pub mod notes;
pub mod server;
