//! Authentication primitives.
//!
//! Credentials and token issuance live in a separate identity service; this
//! crate only verifies the bearer tokens it hands out.
//!
//! - [`jwt`] -- JWT access-token generation and validation.

pub mod jwt;
