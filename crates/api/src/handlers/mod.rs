pub mod inspection;
pub mod organization;
pub mod photo;
