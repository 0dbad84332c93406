//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity matching the database row plus
//! the input DTOs its repository accepts.

pub mod notification;
pub mod project;
pub mod role;
pub mod session;
pub mod status;
pub mod user;
