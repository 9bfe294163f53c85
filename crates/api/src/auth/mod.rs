//! Operator authentication.
//!
//! Tokens are issued by the hosted identity provider; this service only
//! validates them. See [`jwt`].

pub mod jwt;
