//! Request handlers.
//!
//! Operator handlers take an [`AuthOperator`](crate::middleware::auth::AuthOperator)
//! and check the path gym against the token before touching data. Handlers
//! delegate to the core workflows or the `gymflow_db` repositories and map
//! errors via [`AppError`](crate::error::AppError).

pub mod attendance;
pub mod members;
pub mod notifications;
pub mod payments;
pub mod scan;
