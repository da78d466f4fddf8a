//! Core server components
//!
//! - [`Config`] - environment-driven configuration
//! - [`ServerState`] - shared handles passed to every handler
//! - [`Server`] - HTTP server startup and shutdown

mod config;
mod server;
mod state;

pub use config::Config;
pub use server::Server;
pub use state::ServerState;
