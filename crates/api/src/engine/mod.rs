//! Transactional orchestration of the inspection lifecycle.
//!
//! Handlers resolve the caller into a [`Caller`] and delegate to
//! [`InspectionService`], which composes the pure rules in `tripcheck_core`
//! with the repositories in `tripcheck_db` and publishes events after commit.

pub mod inspection_service;

pub use inspection_service::{Caller, InspectionService, StartInspection, SubmitInspection};
