//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` (standalone) or `&mut PgConnection` (inside a transaction) as
//! the first argument.

pub mod inspection_repo;
pub mod organization_repo;
pub mod photo_repo;
pub mod template_repo;
pub mod user_repo;
pub mod vehicle_repo;

pub use inspection_repo::InspectionRepo;
pub use organization_repo::OrganizationRepo;
pub use photo_repo::PhotoRepo;
pub use template_repo::TemplateRepo;
pub use user_repo::UserRepo;
pub use vehicle_repo::VehicleRepo;
