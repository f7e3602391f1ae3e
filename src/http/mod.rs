//! HTTP server module.
//!
//! The server binds a plain HTTP listener (TLS is terminated upstream),
//! starts the datastore connection task once the listener is bound, and
//! shuts down gracefully on SIGTERM/SIGINT.

mod server;
mod shutdown;

pub use server::{start_server, ServerError};
