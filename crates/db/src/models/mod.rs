//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - Projection structs for aggregate count queries where applicable

pub mod approval;
pub mod facts;
pub mod mapping;
pub mod period;
pub mod revision;
