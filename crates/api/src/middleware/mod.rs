//! Request extractors for authentication and gym scoping.
//!
//! - [`auth::AuthOperator`]: the operator named by a JWT Bearer token.

pub mod auth;
