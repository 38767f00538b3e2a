//! Controller logic behind the REST API.
//!
//! - [`responder`]: the stage chain every CRUD action ends in
//! - [`crud`]: index/show/create/upsert/patch/destroy over any store
//! - [`patch`]: JSON Patch validation and application

pub mod crud;
pub mod patch;
pub mod responder;

pub use patch::{apply_patch, PatchApplicationError};
pub use responder::{CrudError, Outcome};
