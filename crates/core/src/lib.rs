//! Pure domain logic for the evaluation workflow engine.
//!
//! This crate has zero internal dependencies so it can be used by the
//! repository layer, the workflow engine, and any future CLI tooling.
//! All database access and HTTP concerns live in the other crates.

pub mod error;
pub mod phase;
pub mod revision;
pub mod status;
pub mod step;
pub mod types;
