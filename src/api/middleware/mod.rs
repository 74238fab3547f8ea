//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Access log: sees every request, including rejected ones
//! 2. Rate limiter: reject early
//! 3. Auth validator: protected routes only, injects `UserContext`

pub mod audit;
pub mod auth;
pub mod rate;
