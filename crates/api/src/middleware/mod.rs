//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireDriver`] -- Requires the `driver` role.

pub mod auth;
pub mod rbac;
