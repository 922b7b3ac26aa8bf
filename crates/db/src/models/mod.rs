//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus the input DTOs its repository accepts.

pub mod inspection;
pub mod organization;
pub mod photo;
pub mod template;
pub mod user;
pub mod vehicle;
