//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Multi-statement mutations
//! that belong to the workflow state machine live in `evalcycle-engine`;
//! the repositories here cover single-table access and the read-side
//! aggregate queries.

pub mod approval_repo;
pub mod facts_repo;
pub mod mapping_repo;
pub mod period_repo;
pub mod revision_repo;

pub use approval_repo::ApprovalStateRepo;
pub use facts_repo::FactsRepo;
pub use mapping_repo::MappingRepo;
pub use period_repo::PeriodRepo;
pub use revision_repo::RevisionRepo;
