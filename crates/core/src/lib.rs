//! Domain rules for trip inspections.
//!
//! Everything in this crate is pure: no I/O, no clock reads (callers pass
//! `now` in), no database access. The `db` and `api` crates compose these
//! rules with persistence and transport.

pub mod access;
pub mod continuity;
pub mod error;
pub mod hashing;
pub mod lifecycle;
pub mod photos;
pub mod results;
pub mod roles;
pub mod types;
