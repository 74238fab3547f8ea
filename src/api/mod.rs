//! HTTP API for the browser front-end.
//!
//! Routes are nested under `/api/`. Public reads need no session; account
//! and booking routes require a bearer token issued at sign-in.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::{api_router, app};
pub use server::{serve, shutdown_signal, start_server, ApiServer};
pub use types::{ApiContext, RateLimiter};
