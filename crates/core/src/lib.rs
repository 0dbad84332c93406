//! Domain logic for the KaryaKita project showcase.
//!
//! This crate has no I/O: the review state machine, the visibility policy,
//! and input validation are pure functions so the db and api layers share a
//! single source of truth.

pub mod account;
pub mod error;
pub mod project;
pub mod review;
pub mod roles;
pub mod sessions;
pub mod types;
pub mod visibility;
