//! Trailhead: a backend bootstrap.
//!
//! Wires an Axum HTTP server with the usual middleware, opens connections to
//! MongoDB, MySQL and Redis after the listener is bound, and installs the
//! validated `users` collection on the document store.

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;
pub mod schema;
pub mod state;
pub mod stores;

pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;
