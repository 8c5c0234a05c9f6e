//! Web server module
//!
//! HTTP surface: search proxy, playback control, viewer event stream and
//! static assets.

mod client_ip;
mod error;
mod handlers;
mod routes;
mod state;

pub use client_ip::{resolve_identity, ClientIdentity};
pub use routes::create_router;
pub use state::AppState;

#[cfg(test)]
mod tests;
