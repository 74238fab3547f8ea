//! API endpoint handlers.
//!
//! Each module corresponds to a page or feature of the front-end.
//! Handlers reuse the marketplace operations and run backend calls on the
//! blocking pool.

pub mod assistant;
pub mod auth;
pub mod bookings;
pub mod categories;
pub mod emergency;
pub mod health;
pub mod me;
pub mod professionals;
